//! Test doubles for the UI side of settings dispatch

use crate::frontend::Frontend;
use std::sync::Mutex;

/// A call made on the frontend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendCall {
    ColorScheme(i32),
    Decorations(i32),
    ScreensaverTimeout(u32),
    Notify(String),
}

/// Frontend that records every call for later inspection
#[derive(Debug, Default)]
pub struct RecordingFrontend {
    calls: Mutex<Vec<FrontendCall>>,
}

impl RecordingFrontend {
    pub fn calls(&self) -> Vec<FrontendCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.calls().is_empty()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    pub fn color_schemes(&self) -> Vec<i32> {
        self.filter(|c| match c {
            FrontendCall::ColorScheme(v) => Some(*v),
            _ => None,
        })
    }

    pub fn decorations(&self) -> Vec<i32> {
        self.filter(|c| match c {
            FrontendCall::Decorations(v) => Some(*v),
            _ => None,
        })
    }

    pub fn timeouts(&self) -> Vec<u32> {
        self.filter(|c| match c {
            FrontendCall::ScreensaverTimeout(v) => Some(*v),
            _ => None,
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.filter(|c| match c {
            FrontendCall::Notify(m) => Some(m.clone()),
            _ => None,
        })
    }

    fn filter<T>(&self, f: impl Fn(&FrontendCall) -> Option<T>) -> Vec<T> {
        self.calls().iter().filter_map(f).collect()
    }

    fn record(&self, call: FrontendCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl Frontend for RecordingFrontend {
    fn set_color_scheme(&self, scheme: i32) {
        self.record(FrontendCall::ColorScheme(scheme));
    }

    fn set_decorations(&self, decorations: i32) {
        self.record(FrontendCall::Decorations(decorations));
    }

    fn set_screensaver_timeout(&self, seconds: u32) {
        self.record(FrontendCall::ScreensaverTimeout(seconds));
    }

    fn notify_user(&self, message: &str) {
        self.record(FrontendCall::Notify(message.to_string()));
    }
}
