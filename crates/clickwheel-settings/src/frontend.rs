//! UI collaborators reached from settings dispatch

/// Appearance, screensaver and message hooks provided by the UI.
///
/// The settings layer only calls through this trait; rendering and timer
/// mechanics live on the other side.
pub trait Frontend: Send + Sync {
    fn set_color_scheme(&self, scheme: i32);

    fn set_decorations(&self, decorations: i32);

    /// Idle time before the screensaver (and backlight-off) kicks in, 0 = never
    fn set_screensaver_timeout(&self, seconds: u32);

    /// Show a short message to the user
    fn notify_user(&self, message: &str);
}

/// Frontend for headless hosts: every call is logged and nothing else happens
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFrontend;

impl Frontend for LogFrontend {
    fn set_color_scheme(&self, scheme: i32) {
        tracing::debug!("Color scheme {}", scheme);
    }

    fn set_decorations(&self, decorations: i32) {
        tracing::debug!("Decorations {}", decorations);
    }

    fn set_screensaver_timeout(&self, seconds: u32) {
        tracing::debug!("Screensaver timeout {}s", seconds);
    }

    fn notify_user(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}
