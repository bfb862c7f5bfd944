pub mod asset;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod history;
pub mod logging;
pub mod mask;
pub mod notification;
pub mod remote;
pub mod storage;
pub use error::{AppError, AppResult};

use crate::editor::Editor;
use crate::notification::DesktopNotifier;
use crate::remote::RemoteCollaborator;
use crate::storage::FileSessionStore;

/// Entrypoint used by front ends: sets up logging, reads `config.json` and
/// opens the editor on the persisted session in the XDG data directory.
pub fn open_editor<R: RemoteCollaborator + 'static>(
    remote: R,
) -> AppResult<Editor<R, DesktopNotifier>> {
    logging::init();
    let config = config::load_app_config();
    let session_dir = config.resolved_session_dir()?;
    tracing::info!(dir = %session_dir.display(), "starting retouch");

    let store = FileSessionStore::with_dir(session_dir)?;
    let notifier = DesktopNotifier::new(config.desktop_notifications);
    Ok(Editor::open(remote, notifier, &config, store))
}
