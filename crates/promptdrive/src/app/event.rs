use std::path::Path;

use tracing::debug;

use crate::app::drive::PromptDrive;
use crate::app::workspace::WorkspaceRoots;
use crate::infra::config::ConfigChangeEvent;

/// Host notifications the drive reacts to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DriveEvent {
    /// The user asked for a refresh.
    RefreshRequested,
    /// Configuration keys changed in the host.
    ConfigurationChanged(ConfigChangeEvent),
    /// The workspace folder changed and its roots were resolved.
    WorkspaceResolved(WorkspaceRoots),
}

/// Whether applying an event requires views to redraw.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Redraw {
    Needed,
    Unchanged,
}

impl PromptDrive {
    /// Applies `event` to the drive state and reports whether views must
    /// redraw.
    ///
    /// Never lists directories or spawns processes; workspace discovery
    /// happens before the event is built.
    pub fn apply_event(&mut self, event: DriveEvent) -> Redraw {
        match event {
            DriveEvent::RefreshRequested => Redraw::Needed,
            DriveEvent::ConfigurationChanged(change) => {
                if self.settings().handle_configuration_change(&change) {
                    return Redraw::Needed;
                }

                Redraw::Unchanged
            }
            DriveEvent::WorkspaceResolved(roots) => {
                let previous = self.workspace_roots();
                let WorkspaceRoots {
                    git_root,
                    repository_dir,
                    workspace_dir,
                } = roots;
                self.update_repository_path(git_root, repository_dir);
                self.update_workspace_path(workspace_dir);

                if self.workspace_roots() == previous {
                    return Redraw::Unchanged;
                }

                Redraw::Needed
            }
        }
    }

    /// Snapshots the stored repository and workspace paths.
    fn workspace_roots(&self) -> WorkspaceRoots {
        WorkspaceRoots {
            git_root: self.git_root().map(Path::to_path_buf),
            repository_dir: self.repository_path().map(Path::to_path_buf),
            workspace_dir: self.workspace_path().map(Path::to_path_buf),
        }
    }

    /// Applies `event` and fires [`PromptDrive::refresh`] when it changed
    /// visible state.
    pub fn dispatch(&mut self, event: DriveEvent) -> Redraw {
        let redraw = self.apply_event(event);
        debug!(?redraw, "drive event applied");
        if redraw == Redraw::Needed {
            self.refresh();
        }

        redraw
    }
}
