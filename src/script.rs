//! KWin activation script generation
//!
//! The generated script runs inside KWin's scripting engine, picks the first
//! window matching the criteria, activates it, and reports back over D-Bus by
//! calling one of the two methods on [`CALLBACK_ADDRESS`]. The same address is
//! what [`crate::receiver`] registers, so both sides read it from here.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::debug_log::debug_log;
use crate::error::ActivationError;

/// Bus address of the callback service the script calls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackAddress {
    pub bus_name: &'static str,
    pub object_path: &'static str,
    pub interface: &'static str,
    pub found_method: &'static str,
    pub not_found_method: &'static str,
}

pub const CALLBACK_ADDRESS: CallbackAddress = CallbackAddress {
    bus_name: "com.example.WindowManagement",
    object_path: "/WindowManagement",
    interface: "com.example.WindowManagement",
    found_method: "WindowFound",
    not_found_method: "WindowNotFound",
};

/// KWin scripting API generation
///
/// Plasma 6 renamed the client list and active-client properties and moved
/// script objects under `/Scripting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KwinApi {
    #[default]
    Plasma5,
    Plasma6,
}

impl KwinApi {
    /// Pick the API from `KDE_SESSION_VERSION`
    pub fn detect() -> Self {
        Self::from_session_version(std::env::var("KDE_SESSION_VERSION").ok().as_deref())
    }

    pub fn from_session_version(version: Option<&str>) -> Self {
        match version {
            Some("6") => KwinApi::Plasma6,
            _ => KwinApi::Plasma5,
        }
    }

    fn window_list_fn(&self) -> &'static str {
        match self {
            KwinApi::Plasma5 => "clientList",
            KwinApi::Plasma6 => "windowList",
        }
    }

    fn active_window_property(&self) -> &'static str {
        match self {
            KwinApi::Plasma5 => "activeClient",
            KwinApi::Plasma6 => "activeWindow",
        }
    }
}

/// A window as the script sees it: `caption` and `resourceClass`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowInfo {
    pub caption: String,
    pub resource_class: String,
}

impl WindowInfo {
    pub fn new(caption: &str, resource_class: &str) -> Self {
        Self {
            caption: caption.to_string(),
            resource_class: resource_class.to_string(),
        }
    }
}

/// What to look for. Class wins over title when both are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCriteria {
    title: Option<String>,
    class: Option<String>,
}

impl MatchCriteria {
    /// Build criteria, treating empty strings as absent
    pub fn new(title: Option<&str>, class: Option<&str>) -> Result<Self, ActivationError> {
        let title = title.filter(|t| !t.is_empty()).map(String::from);
        let class = class.filter(|c| !c.is_empty()).map(String::from);
        if title.is_none() && class.is_none() {
            return Err(ActivationError::MissingCriteria);
        }
        Ok(Self { title, class })
    }

    pub fn by_class(class: &str) -> Result<Self, ActivationError> {
        Self::new(None, Some(class))
    }

    pub fn by_title(title: &str) -> Result<Self, ActivationError> {
        Self::new(Some(title), None)
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn script(&self, api: KwinApi) -> String {
        generate_activation_script(self.title(), self.class(), api)
    }

    /// Index of the first window the generated script would activate
    pub fn select(&self, windows: &[WindowInfo]) -> Option<usize> {
        if let Some(class) = self.class() {
            return windows.iter().position(|w| w.resource_class == class);
        }

        let pattern = self.title().unwrap_or("");
        let regex = match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(regex) => regex,
            Err(e) => {
                debug_log("SCRIPT", &format!("Invalid title pattern '{}': {}", pattern, e));
                return None;
            }
        };
        windows.iter().position(|w| regex.is_match(&w.caption))
    }
}

impl std::fmt::Display for MatchCriteria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.class(), self.title()) {
            (Some(class), _) => write!(f, "class='{}'", class),
            (None, Some(title)) => write!(f, "title='{}'", title),
            (None, None) => write!(f, "<empty>"),
        }
    }
}

/// Escape text for a JavaScript string literal in either quote style
pub fn escape_js_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(ch),
        }
    }
    out
}

/// Generate the KWin script that activates the first matching window.
///
/// Does not validate: with neither criterion the title regex is empty and the
/// first window matches. Callers go through [`MatchCriteria`] for that.
pub fn generate_activation_script(
    title: Option<&str>,
    class: Option<&str>,
    api: KwinApi,
) -> String {
    let title = escape_js_string(title.unwrap_or(""));
    let class = escape_js_string(class.unwrap_or(""));
    let addr = CALLBACK_ADDRESS;

    format!(
        r#"function activateWindow() {{
    print("summon: looking for class='{class}', title='{title}'");
    var titlePattern = new RegExp('{title}', 'i');
    var wantedClass = '{class}';
    var byClass = wantedClass.length > 0;
    var windows = workspace.{list}();
    print("summon: " + windows.length + " windows");
    for (var i = 0; i < windows.length; i++) {{
        var w = windows[i];
        print("summon: window " + i + ": caption='" + w.caption + "', class='" + w.resourceClass + "'");
        var classMatch = byClass && w.resourceClass == wantedClass;
        var titleMatch = !byClass && titlePattern.test(w.caption);
        if (classMatch || titleMatch) {{
            print("summon: activating " + w.caption);
            workspace.{active} = w;
            callDBus("{bus}", "{path}", "{iface}", "{found}");
            return;
        }}
    }}
    print("summon: no matching window");
    callDBus("{bus}", "{path}", "{iface}", "{not_found}");
}}
activateWindow();
"#,
        class = class,
        title = title,
        list = api.window_list_fn(),
        active = api.active_window_property(),
        bus = addr.bus_name,
        path = addr.object_path,
        iface = addr.interface,
        found = addr.found_method,
        not_found = addr.not_found_method,
    )
}
