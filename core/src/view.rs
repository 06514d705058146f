//! Read-only view models of the share manager, consumed by the CLI and the
//! HTTP API. Nothing here mutates a session.

use crate::directory::SharedDirectory;
use crate::flags::ShareFlag;
use crate::groups::{GroupCatalog, GroupId, Visibility};
use crate::session::EditMode;
use serde::Serialize;
use std::fmt::Write;

pub const ALL_GROUPS_LABEL: &str = "All Friend nodes";
/// Shown for a directory restricted only to groups the catalog lacks.
pub const UNKNOWN_GROUPS_LABEL: &str = "unknown groups";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagCell {
	pub flag: ShareFlag,
	pub label: &'static str,
	pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareRow {
	pub index: usize,
	pub path: String,
	pub display_name: String,
	pub mask: u32,
	pub flags: Vec<FlagCell>,
	pub visibility: String,
	pub editable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareTable {
	pub mode: EditMode,
	pub action_label: &'static str,
	pub rows: Vec<ShareRow>,
}

/// One checkbox of the visibility popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupChoice {
	pub id: GroupId,
	pub label: String,
	pub checked: bool,
}

pub fn action_label(mode: EditMode) -> &'static str {
	match mode {
		EditMode::ReadOnly => "Edit",
		EditMode::Editing => "Apply and Close",
	}
}

pub fn visibility_label(visibility: &Visibility, catalog: &GroupCatalog) -> String {
	if visibility.is_all() {
		return ALL_GROUPS_LABEL.to_string();
	}
	let labels = catalog.labels_for(visibility);
	if labels.is_empty() {
		return UNKNOWN_GROUPS_LABEL.to_string();
	}
	labels.join(", ")
}

/// Checkbox states for the popup. A directory visible to all groups lists
/// none of them explicitly, so nothing is checked.
pub fn group_choices(visibility: &Visibility, catalog: &GroupCatalog) -> Vec<GroupChoice> {
	catalog
		.entries()
		.iter()
		.map(|entry| GroupChoice {
			id: entry.id.clone(),
			label: entry.label.clone(),
			checked: visibility.lists(&entry.id),
		})
		.collect()
}

pub fn share_table(mode: EditMode, dirs: &[SharedDirectory], catalog: &GroupCatalog) -> ShareTable {
	let editable = mode == EditMode::Editing;
	let rows = dirs
		.iter()
		.enumerate()
		.map(|(index, dir)| ShareRow {
			index,
			path: dir.path.clone(),
			display_name: dir.display_name.clone(),
			mask: dir.permission_mask(),
			flags: ShareFlag::ALL
				.iter()
				.map(|flag| FlagCell {
					flag: *flag,
					label: flag.label(),
					checked: dir.flags.get(*flag),
				})
				.collect(),
			visibility: visibility_label(&dir.visibility, catalog),
			editable,
		})
		.collect();
	ShareTable {
		mode,
		action_label: action_label(mode),
		rows,
	}
}

pub fn render_text(table: &ShareTable) -> String {
	let mut out = String::new();
	if table.rows.is_empty() {
		out.push_str("no shared directories\n");
	}
	for row in &table.rows {
		let marks: String = row
			.flags
			.iter()
			.map(|cell| if cell.checked { 'x' } else { '-' })
			.collect();
		let name = if row.display_name.is_empty() {
			"-"
		} else {
			row.display_name.as_str()
		};
		writeln!(
			out,
			"{:>3}  [{}]  {}  ({})  {}",
			row.index, marks, row.path, name, row.visibility
		)
		.ok();
	}
	writeln!(out, "mode: {:?}  [{}]", table.mode, table.action_label).ok();
	out
}
