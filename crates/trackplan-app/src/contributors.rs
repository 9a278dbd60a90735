//! Contributor list controllers
//!
//! [`ContributorsCtrl`] manages the list and the "add contributor" row; a
//! [`ContributorCtrl`] exposes one entry's display name and removal.

use std::collections::BTreeMap;
use std::rc::Rc;

use trackplan_reactive::{Memo, Signal, batch, untrack};

use crate::contributor::{
	Contributor, ContributorEditArea, ContributorKind, DEFAULT_NUM_MEMBERS,
	EXTERNAL_CONTRIBUTOR_VALUE,
};
use crate::counter::{Counter, Observation};
use crate::error::CounterError;
use crate::tracker::User;

/// Controller for the contributor list
pub struct ContributorsCtrl {
	contributors: Signal<Vec<Contributor>>,
	edit_area: ContributorEditArea,
	new_entry_kind: Memo<ContributorKind>,
	user_map: Memo<BTreeMap<String, User>>,
	is_empty: Observation,
}

impl ContributorsCtrl {
	pub fn new(
		contributors: &Signal<Vec<Contributor>>,
		edit_area: &ContributorEditArea,
		user_map: &Memo<BTreeMap<String, User>>,
	) -> Self {
		let new_entry_kind = Memo::new({
			let id = edit_area.id.clone();
			move || {
				if id.with(|id| id == EXTERNAL_CONTRIBUTOR_VALUE) {
					ContributorKind::External
				} else {
					ContributorKind::Tracker
				}
			}
		});
		let is_empty: Observation = Rc::new({
			let contributors = contributors.clone();
			move || contributors.with(Vec::is_empty)
		});

		Self {
			contributors: contributors.clone(),
			edit_area: edit_area.clone(),
			new_entry_kind,
			user_map: user_map.clone(),
			is_empty,
		}
	}

	/// Registers "no contributors" as an invalid setting.
	pub fn register_validity(&self, counter: &Counter) -> Result<(), CounterError> {
		counter.add(&self.is_empty)
	}

	/// Kind of the contributor the edit row would create.
	pub fn new_entry_kind(&self) -> Memo<ContributorKind> {
		self.new_entry_kind.clone()
	}

	/// Appends a contributor built from the edit row and clears the row's identity fields.
	///
	/// The capacity is kept so that consecutive entries can share it.
	pub fn create(&self) {
		let area = &self.edit_area;
		let contributor = untrack(|| {
			let hours_per_week = area.hours_per_week.get();
			match self.new_entry_kind.get() {
				ContributorKind::Tracker => Contributor::tracker(area.id.get(), hours_per_week),
				ContributorKind::External => {
					Contributor::external(area.name.get(), area.num_members.get(), hours_per_week)
				}
			}
		});
		tracing::debug!(kind = ?contributor.kind(), "adding contributor");

		batch(|| {
			if contributor.kind() == ContributorKind::External {
				area.name.set(String::new());
				area.num_members.set(DEFAULT_NUM_MEMBERS);
			}
			area.id.set(String::new());
			self.contributors.update(|list| list.push(contributor));
		});
	}

	/// Clears the edit row.
	pub fn reset(&self) {
		self.edit_area.clear();
	}

	/// Removes a contributor from the list. Unknown contributors are ignored.
	pub fn remove(&self, contributor: &Contributor) {
		let present = self
			.contributors
			.with_untracked(|list| list.iter().any(|c| c.is_same(contributor)));
		if present {
			self.contributors
				.update(|list| list.retain(|c| !c.is_same(contributor)));
		}
	}

	/// Moves the contributor at `from` to position `to`, as after a drag and drop.
	pub fn reorder(&self, from: usize, to: usize) {
		let len = self.contributors.with_untracked(Vec::len);
		if from == to || from >= len || to >= len {
			return;
		}
		self.contributors.update(|list| {
			let contributor = list.remove(from);
			list.insert(to, contributor);
		});
	}

	/// Controller for one entry.
	pub fn contributor_ctrl(&self, contributor: &Contributor) -> ContributorCtrl {
		ContributorCtrl::new(contributor, &self.contributors, &self.user_map)
	}
}

impl core::fmt::Debug for ContributorsCtrl {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("ContributorsCtrl")
			.field("contributors", &self.contributors)
			.finish_non_exhaustive()
	}
}

/// Controller for one contributor
pub struct ContributorCtrl {
	contributor: Contributor,
	contributors: Signal<Vec<Contributor>>,
	name: Memo<String>,
}

impl ContributorCtrl {
	pub fn new(
		contributor: &Contributor,
		contributors: &Signal<Vec<Contributor>>,
		user_map: &Memo<BTreeMap<String, User>>,
	) -> Self {
		let name = match contributor {
			Contributor::Tracker(tracker) => {
				let (id, user_map) = (tracker.id.clone(), user_map.clone());
				Memo::new(move || {
					user_map.with(|users| match users.get(&id) {
						Some(user) => user.full_name.clone(),
						None => format!("Unknown name (User ID = {id})"),
					})
				})
			}
			Contributor::External(external) => {
				let name = external.name.clone();
				Memo::new(move || name.get())
			}
		};
		Self {
			contributor: contributor.clone(),
			contributors: contributors.clone(),
			name,
		}
	}

	/// The contributor.
	pub fn contributor(&self) -> &Contributor {
		&self.contributor
	}

	/// Display name.
	pub fn name(&self) -> Memo<String> {
		self.name.clone()
	}

	/// Removes the contributor from its list.
	pub fn remove(&self) {
		let contributor = &self.contributor;
		self.contributors
			.update(|list| list.retain(|c| !c.is_same(contributor)));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::contributor::{DEFAULT_HOURS_PER_WEEK, PlainContributor};
	use rstest::rstest;
	use serial_test::serial;

	fn fixture() -> (Signal<Vec<Contributor>>, ContributorEditArea, ContributorsCtrl) {
		let contributors = Signal::new(Vec::new());
		let area = ContributorEditArea::new();
		let users = Memo::new(|| {
			BTreeMap::from([(
				"1-1".to_string(),
				User {
					id: "1-1".to_string(),
					full_name: "Ada Lovelace".to_string(),
					avatar_url: String::new(),
				},
			)])
		});
		let ctrl = ContributorsCtrl::new(&contributors, &area, &users);
		(contributors, area, ctrl)
	}

	#[rstest]
	#[serial]
	fn test_create_external_clears_row() {
		let (contributors, area, ctrl) = fixture();
		area.id.set(EXTERNAL_CONTRIBUTOR_VALUE.to_string());
		area.name.set("QA".to_string());
		area.num_members.set(3);
		area.hours_per_week.set(20.0);
		assert_eq!(ctrl.new_entry_kind().get_untracked(), ContributorKind::External);

		ctrl.create();

		let list = contributors.get_untracked();
		assert_eq!(list.len(), 1);
		assert_eq!(
			list[0].to_plain(),
			PlainContributor::External {
				name: "QA".to_string(),
				num_members: 3,
				hours_per_week: 20.0,
			}
		);
		assert_eq!(area.id.get_untracked(), "");
		assert_eq!(area.name.get_untracked(), "");
		assert_eq!(area.num_members.get_untracked(), DEFAULT_NUM_MEMBERS);
		assert_eq!(area.hours_per_week.get_untracked(), 20.0);
		assert_eq!(ctrl.new_entry_kind().get_untracked(), ContributorKind::Tracker);
	}

	#[rstest]
	#[serial]
	fn test_reset_restores_row_defaults() {
		let (contributors, area, ctrl) = fixture();
		area.id.set(EXTERNAL_CONTRIBUTOR_VALUE.to_string());
		area.name.set("Ops".to_string());
		area.num_members.set(4);
		area.hours_per_week.set(12.0);

		ctrl.reset();

		assert_eq!(area.id.get_untracked(), "");
		assert_eq!(area.name.get_untracked(), "");
		assert_eq!(area.num_members.get_untracked(), DEFAULT_NUM_MEMBERS);
		assert_eq!(area.hours_per_week.get_untracked(), DEFAULT_HOURS_PER_WEEK);
		assert!(contributors.get_untracked().is_empty());
	}

	#[rstest]
	#[serial]
	fn test_tracker_contributor_name_resolution() {
		let (contributors, area, ctrl) = fixture();
		for id in ["1-1", "1-9"] {
			area.id.set(id.to_string());
			ctrl.create();
		}
		let list = contributors.get_untracked();

		assert_eq!(ctrl.contributor_ctrl(&list[0]).name().get_untracked(), "Ada Lovelace");
		assert_eq!(
			ctrl.contributor_ctrl(&list[1]).name().get_untracked(),
			"Unknown name (User ID = 1-9)"
		);
	}

	#[rstest]
	#[serial]
	fn test_remove_and_reorder_use_identity() {
		let (contributors, _area, ctrl) = fixture();
		let first = Contributor::tracker("1-1", 40.0);
		let second = Contributor::tracker("1-1", 40.0);
		let third = Contributor::external("Docs", 1, 8.0);
		contributors.set(vec![first.clone(), second.clone(), third.clone()]);

		ctrl.reorder(2, 0);
		ctrl.contributor_ctrl(&first).remove();

		let list = contributors.get_untracked();
		assert_eq!(list.len(), 2);
		assert!(list[0].is_same(&third));
		assert!(list[1].is_same(&second));
	}

	#[rstest]
	#[serial]
	fn test_empty_list_is_invalid() {
		let (contributors, _area, ctrl) = fixture();
		let counter = Counter::default();

		ctrl.register_validity(&counter).unwrap();
		assert_eq!(counter.count().get_untracked(), 1);

		contributors.set(vec![Contributor::tracker("1-1", 40.0)]);
		assert_eq!(counter.count().get_untracked(), 0);
	}
}
