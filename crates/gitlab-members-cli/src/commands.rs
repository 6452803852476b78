//! CLI command implementations.

use gitlab_members::{
    ApplyReport, GitLabClient, GroupId, GroupMembersConfig, GroupMembersResource,
    GroupMembersState, MembersError, Plan, PlanAction,
};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;
use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Members(#[from] MembersError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid declaration file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid state file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("State already tracks group {0}; destroy it or use another state file")]
    AlreadyTracked(GroupId),
}

pub type Result<T> = std::result::Result<T, CliError>;

type Resource = GroupMembersResource<GitLabClient>;

/// Read a YAML member declaration.
pub fn load_declaration(path: &Path) -> Result<GroupMembersConfig> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Read the state file; a missing file is an empty state.
pub fn load_state(path: &Path) -> Result<GroupMembersState> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(GroupMembersState::default()),
        Err(e) => Err(e.into()),
    }
}

/// Write the state file atomically.
pub fn save_state(path: &Path, state: &GroupMembersState) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut file, state)?;
    file.write_all(b"\n")?;
    file.persist(path).map_err(|e| CliError::Io(e.error))?;

    tracing::debug!(path = %path.display(), "State saved");
    Ok(())
}

/// Describe a plan for humans.
pub fn render_plan(plan: &Plan, group: &GroupId) -> String {
    let mut out = String::new();
    let changes = &plan.changes;

    let _ = match plan.action {
        PlanAction::NoOp => writeln!(out, "Group {group}: no changes, membership is up to date."),
        PlanAction::Create => writeln!(out, "Group {group}: will be created."),
        PlanAction::Update => writeln!(out, "Group {group}: will be updated in place."),
        PlanAction::Replace => writeln!(
            out,
            "Group {group}: must be replaced, members of the old group will be removed first."
        ),
    };

    for member in &changes.to_add {
        let _ = writeln!(
            out,
            "  + user {} ({}{})",
            member.user_id,
            member.access_level,
            expiry_suffix(member.expires_at.as_deref())
        );
    }
    for member in &changes.to_update {
        let _ = writeln!(
            out,
            "  ~ user {} -> {}{}",
            member.user_id,
            member.access_level,
            expiry_suffix(member.expires_at.as_deref())
        );
    }
    for member in &changes.to_remove {
        let note = if member.access_level.is_owner() {
            ", kept: owners are never removed"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  - user {} {}({}{note})",
            member.user_id,
            if member.username.is_empty() {
                String::new()
            } else {
                format!("@{} ", member.username)
            },
            member.access_level,
        );
    }

    out
}

fn expiry_suffix(expires_at: Option<&str>) -> String {
    match expires_at {
        Some(date) => format!(", expires {date}"),
        None => String::new(),
    }
}

fn print_report(report: &ApplyReport) {
    println!(
        "Added: {}  Updated: {}  Removed: {}  Already members: {}",
        report.added, report.updated, report.removed, report.conflicted
    );
    if !report.skipped_owners.is_empty() {
        println!("Owners left in place: {:?}", report.skipped_owners);
    }
}

/// Show what `apply` would change.
pub async fn plan(resource: &Resource, config_path: &Path, state_path: &Path) -> Result<()> {
    let config = load_declaration(config_path)?;
    let mut state = load_state(state_path)?;

    let plan = resource.plan(&config, &mut state).await?;
    print!("{}", render_plan(&plan, &config.group_id));
    Ok(())
}

/// Reconcile the group against the declaration and save the new state.
pub async fn apply(resource: &Resource, config_path: &Path, state_path: &Path) -> Result<()> {
    let config = load_declaration(config_path)?;
    let mut state = load_state(state_path)?;

    tracing::info!(group = %config.group_id, "Applying group members");
    let result = resource.apply(&config, &mut state).await;
    save_state(state_path, &state)?;

    let report = result?;
    print_report(&report);
    println!("Status: {:?}", state.status);
    Ok(())
}

/// Re-read the tracked group into the state file.
pub async fn refresh(resource: &Resource, state_path: &Path) -> Result<()> {
    let mut state = load_state(state_path)?;
    if !state.exists() {
        println!("No group is tracked in {}", state_path.display());
        return Ok(());
    }

    match resource.read(&mut state).await {
        Ok(()) => {
            save_state(state_path, &state)?;
            println!("Refreshed {} members", state.members.len());
            Ok(())
        }
        Err(e @ MembersError::GroupGone(_)) => {
            save_state(state_path, &state)?;
            println!("Warning: {e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove the tracked members, except owners, and clear the state.
pub async fn destroy(resource: &Resource, state_path: &Path) -> Result<()> {
    let mut state = load_state(state_path)?;
    if !state.exists() {
        println!("Nothing to destroy");
        return Ok(());
    }

    let result = resource.delete(&mut state).await;
    save_state(state_path, &state)?;

    print_report(&result?);
    Ok(())
}

/// Start tracking an existing group.
pub async fn import(resource: &Resource, group: &str, state_path: &Path) -> Result<()> {
    let existing = load_state(state_path)?;
    if let Some(id) = existing.id {
        return Err(CliError::AlreadyTracked(id));
    }

    let state = resource.import(GroupId::from(group)).await?;
    save_state(state_path, &state)?;
    println!("Imported {} members of group {group}", state.members.len());
    Ok(())
}
