//! Element commands and their in-page interpreter.
//!
//! A locator never holds a DOM node. Each interaction is serialized as an
//! [`ElementCommand`] (selector chain plus operation) and resolved from
//! scratch inside the page, so every query sees the live document.

use crate::result::{PomError, PomResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Innermost elements whose text matches
    Text(TextMatch),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// Elements whose placeholder matches
    Placeholder(TextMatch),
    /// ARIA role, optionally filtered by accessible name
    Role {
        /// Explicit or implicit role (`link`, `button`, `textbox`, ...)
        role: String,
        /// Accessible name filter
        name: Option<TextMatch>,
    },
}

/// Text comparison: case-insensitive substring unless `exact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMatch {
    /// Text to look for
    pub text: String,
    /// Require whole-string, case-sensitive equality
    pub exact: bool,
}

impl TextMatch {
    /// Substring match
    pub fn contains(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            exact: false,
        }
    }

    /// Exact match
    pub fn exact(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            exact: true,
        }
    }
}

impl Selector {
    /// Create a CSS selector
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::XPath(selector.into())
    }

    /// Create a text selector
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextMatch::contains(text))
    }

    /// Create a test ID selector
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a placeholder selector
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::Placeholder(TextMatch::contains(text))
    }

    /// Create a role selector filtered by accessible name
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: Some(TextMatch::contains(name)),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::Text(t) => write!(f, "text={}", quoted(t)),
            Self::TestId(id) => write!(f, "testid={id}"),
            Self::Placeholder(t) => write!(f, "placeholder={}", quoted(t)),
            Self::Role { role, name: None } => write!(f, "role={role}"),
            Self::Role {
                role,
                name: Some(name),
            } => write!(f, "role={role}[name={}]", quoted(name)),
        }
    }
}

fn quoted(t: &TextMatch) -> String {
    if t.exact {
        format!("{:?}s", t.text)
    } else {
        format!("{:?}i", t.text)
    }
}

/// One hop in a locator chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Selector evaluated inside every element matched by the previous step
    pub selector: Selector,
    /// Keep only this match; negative counts from the end
    pub nth: Option<i64>,
}

/// Operation applied to the resolved element(s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DomOp {
    /// Click via `HTMLElement.click()`
    Click,
    /// Replace the value of an input and fire `input`/`change`
    Fill {
        /// New value
        value: String,
    },
    /// Focus and dispatch a key press
    Press {
        /// Key name (`Enter`, `a`, ...)
        key: String,
    },
    /// Focus the element
    Focus,
    /// Toggle a checkbox until it has the requested state
    SetChecked {
        /// Desired state
        checked: bool,
    },
    /// Dispatch synthetic hover events
    Hover,
    /// Scroll into view and report the bounding box
    BoundingBox,
    /// Visibility of the first match
    IsVisible,
    /// Whether the first match is enabled
    IsEnabled,
    /// `textContent` of the first match
    TextContent,
    /// `textContent` of every match
    AllTextContents,
    /// Number of matches
    Count,
    /// Attribute of the first match
    Attribute {
        /// Attribute name
        name: String,
    },
    /// Class attribute of the first match
    ClassName,
}

impl DomOp {
    /// Stable name, used for logging and mock scripting
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Fill { .. } => "fill",
            Self::Press { .. } => "press",
            Self::Focus => "focus",
            Self::SetChecked { .. } => "setChecked",
            Self::Hover => "hover",
            Self::BoundingBox => "boundingBox",
            Self::IsVisible => "isVisible",
            Self::IsEnabled => "isEnabled",
            Self::TextContent => "textContent",
            Self::AllTextContents => "allTextContents",
            Self::Count => "count",
            Self::Attribute { .. } => "attribute",
            Self::ClassName => "className",
        }
    }

    /// Whether the element must be visible and enabled first
    #[must_use]
    pub const fn is_action(&self) -> bool {
        matches!(
            self,
            Self::Click
                | Self::Fill { .. }
                | Self::Press { .. }
                | Self::Focus
                | Self::SetChecked { .. }
                | Self::Hover
                | Self::BoundingBox
        )
    }
}

/// A selector chain plus the operation to run on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementCommand {
    /// Selector chain, outermost first
    pub chain: Vec<Step>,
    /// Operation
    pub op: DomOp,
    /// Fail when more than one element matches
    pub strict: bool,
}

impl ElementCommand {
    /// Human-readable chain, e.g. `css=.todo-list li >> nth=1 >> css=.toggle`
    #[must_use]
    pub fn target(&self) -> String {
        describe_chain(&self.chain)
    }

    /// Render the self-contained script that executes this command.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the command cannot be serialized.
    pub fn to_script(&self) -> PomResult<String> {
        let payload = serde_json::to_string(self)?;
        Ok(format!("({DOM_RUNTIME})({payload})"))
    }
}

/// Render a selector chain for messages.
#[must_use]
pub fn describe_chain(chain: &[Step]) -> String {
    chain
        .iter()
        .map(|step| match step.nth {
            Some(n) => format!("{} >> nth={n}", step.selector),
            None => step.selector.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" >> ")
}

/// Result of running an [`ElementCommand`] in the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome {
    /// Operation ran; `value` carries query results
    Ok {
        /// Query result (`null` for actions)
        #[serde(default)]
        value: Value,
    },
    /// Nothing matched
    NotFound,
    /// First match is not visible
    NotVisible,
    /// First match is disabled
    Disabled,
    /// Strict command matched several elements
    Ambiguous {
        /// Number of matches
        count: usize,
    },
}

impl Outcome {
    /// Successful outcome with no value
    #[must_use]
    pub const fn done() -> Self {
        Self::Ok { value: Value::Null }
    }

    /// Successful outcome carrying a value
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Ok {
            value: value.into(),
        }
    }

    /// Word used in "element ... not <reason>" messages
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Ok { .. } | Self::Ambiguous { .. } => "unique",
            Self::NotFound => "found",
            Self::NotVisible => "visible",
            Self::Disabled => "enabled",
        }
    }
}

/// Bounding box of an element in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Center point
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Parse from an outcome value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a bounding box.
    pub fn from_value(value: Value) -> PomResult<Self> {
        serde_json::from_value(value).map_err(|e| PomError::ScriptError {
            message: format!("bad bounding box: {e}"),
        })
    }
}

/// In-page interpreter for [`ElementCommand`]. Evaluates to an [`Outcome`].
pub const DOM_RUNTIME: &str = r#"(cmd) => {
  const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
  const matches = (actual, m) => m.exact
    ? norm(actual) === norm(m.text)
    : norm(actual).toLowerCase().includes(norm(m.text).toLowerCase());
  const visible = (el) => {
    const style = window.getComputedStyle(el);
    if (style.visibility === 'hidden' || style.display === 'none') return false;
    const r = el.getBoundingClientRect();
    return r.width > 0 && r.height > 0;
  };
  const implicitRole = (el) => {
    const tag = el.tagName.toLowerCase();
    if (tag === 'a' && el.hasAttribute('href')) return 'link';
    if (tag === 'button') return 'button';
    if (tag === 'textarea') return 'textbox';
    if (tag === 'input') {
      const t = (el.getAttribute('type') || 'text').toLowerCase();
      if (t === 'checkbox' || t === 'radio') return t;
      if (t === 'submit' || t === 'button' || t === 'reset') return 'button';
      return 'textbox';
    }
    if (/^h[1-6]$/.test(tag)) return 'heading';
    if (tag === 'li') return 'listitem';
    if (tag === 'ul' || tag === 'ol') return 'list';
    return null;
  };
  const role = (el) => el.getAttribute('role') || implicitRole(el);
  const accessibleName = (el) => el.getAttribute('aria-label')
    || el.textContent || el.getAttribute('value') || el.getAttribute('title') || '';
  const query = (root, sel) => {
    const all = (css) => Array.from(root.querySelectorAll(css));
    switch (sel.kind) {
      case 'css': return all(sel.value);
      case 'testId': return all('[data-testid="' + CSS.escape(sel.value) + '"]');
      case 'placeholder': return all('[placeholder]').filter((el) => matches(el.getAttribute('placeholder'), sel.value));
      case 'text': {
        const hits = all('*').filter((el) => matches(el.textContent, sel.value));
        return hits.filter((el) => !hits.some((o) => o !== el && el.contains(o)));
      }
      case 'role': return all('*').filter((el) => role(el) === sel.value.role
        && (!sel.value.name || matches(accessibleName(el), sel.value.name)));
      case 'xPath': {
        const snap = document.evaluate(sel.value, root, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
        const out = [];
        for (let i = 0; i < snap.snapshotLength; i++) out.push(snap.snapshotItem(i));
        return out;
      }
    }
    return [];
  };
  let els = [document];
  for (const step of cmd.chain) {
    const next = [];
    for (const root of els) for (const el of query(root, step.selector)) if (!next.includes(el)) next.push(el);
    if (step.nth === null || step.nth === undefined) { els = next; continue; }
    const i = step.nth < 0 ? next.length + step.nth : step.nth;
    els = i >= 0 && i < next.length ? [next[i]] : [];
  }
  const op = cmd.op;
  if (op.op === 'count') return { status: 'ok', value: els.length };
  if (op.op === 'allTextContents') return { status: 'ok', value: els.map((el) => el.textContent || '') };
  if (els.length === 0) return { status: 'notFound' };
  if (cmd.strict && els.length > 1) return { status: 'ambiguous', count: els.length };
  const el = els[0];
  switch (op.op) {
    case 'isVisible': return { status: 'ok', value: visible(el) };
    case 'isEnabled': return { status: 'ok', value: !el.disabled };
    case 'textContent': return { status: 'ok', value: el.textContent };
    case 'attribute': return { status: 'ok', value: el.getAttribute(op.name) };
    case 'className': return { status: 'ok', value: el.getAttribute('class') || '' };
  }
  if (!visible(el)) return { status: 'notVisible' };
  if (el.disabled) return { status: 'disabled' };
  switch (op.op) {
    case 'boundingBox': {
      el.scrollIntoView({ block: 'center', inline: 'center' });
      const r = el.getBoundingClientRect();
      return { status: 'ok', value: { x: r.x, y: r.y, width: r.width, height: r.height } };
    }
    case 'click': el.click(); break;
    case 'focus': el.focus(); break;
    case 'hover':
      for (const type of ['pointerover', 'mouseover', 'mouseenter', 'mousemove']) {
        el.dispatchEvent(new MouseEvent(type, { bubbles: type !== 'mouseenter' }));
      }
      break;
    case 'fill': {
      el.focus();
      const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
      const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
      setter.call(el, op.value);
      el.dispatchEvent(new Event('input', { bubbles: true }));
      el.dispatchEvent(new Event('change', { bubbles: true }));
      break;
    }
    case 'press': {
      el.focus();
      const init = { key: op.key, bubbles: true, cancelable: true };
      el.dispatchEvent(new KeyboardEvent('keydown', init));
      el.dispatchEvent(new KeyboardEvent('keypress', init));
      el.dispatchEvent(new KeyboardEvent('keyup', init));
      break;
    }
    case 'setChecked':
      if (el.checked !== op.checked) el.click();
      return { status: 'ok', value: el.checked };
  }
  return { status: 'ok', value: null };
}"#;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    mod serialization_tests {
        use super::*;

        #[test]
        fn test_command_wire_format() {
            let cmd = ElementCommand {
                chain: vec![
                    Step {
                        selector: Selector::css(".todo-list li"),
                        nth: Some(1),
                    },
                    Step {
                        selector: Selector::css(".toggle"),
                        nth: None,
                    },
                ],
                op: DomOp::SetChecked { checked: true },
                strict: true,
            };
            let value = serde_json::to_value(&cmd).unwrap();
            assert_eq!(value["chain"][0]["selector"]["kind"], "css");
            assert_eq!(value["chain"][0]["nth"], 1);
            assert_eq!(value["op"], json!({"op": "setChecked", "checked": true}));
        }

        #[test]
        fn test_role_selector_wire_format() {
            let value = serde_json::to_value(Selector::role("link", "Active")).unwrap();
            assert_eq!(
                value,
                json!({"kind": "role", "value": {"role": "link", "name": {"text": "Active", "exact": false}}})
            );
        }

        #[test]
        fn test_xpath_kind_matches_runtime() {
            let value = serde_json::to_value(Selector::xpath("//h2")).unwrap();
            assert_eq!(value["kind"], "xPath");
            assert!(DOM_RUNTIME.contains("case 'xPath'"));
        }

        #[test]
        fn test_outcome_parsing() {
            let ok: Outcome = serde_json::from_value(json!({"status": "ok", "value": 3})).unwrap();
            assert_eq!(ok, Outcome::value(3));
            let missing: Outcome = serde_json::from_value(json!({"status": "notFound"})).unwrap();
            assert_eq!(missing, Outcome::NotFound);
            let many: Outcome =
                serde_json::from_value(json!({"status": "ambiguous", "count": 2})).unwrap();
            assert_eq!(many, Outcome::Ambiguous { count: 2 });
            let action: Outcome = serde_json::from_value(json!({"status": "ok"})).unwrap();
            assert_eq!(action, Outcome::done());
        }

        #[test]
        fn test_script_embeds_payload() {
            let cmd = ElementCommand {
                chain: vec![Step {
                    selector: Selector::css("#username"),
                    nth: None,
                }],
                op: DomOp::Fill {
                    value: "it's \"quoted\"".to_string(),
                },
                strict: true,
            };
            let script = cmd.to_script().unwrap();
            assert!(script.starts_with("((cmd) =>"));
            assert!(script.contains(r#""value":"it's \"quoted\"""#));
        }
    }

    mod describe_tests {
        use super::*;

        #[test]
        fn test_chain_description() {
            let chain = vec![
                Step {
                    selector: Selector::css(".todo-list li"),
                    nth: Some(-1),
                },
                Step {
                    selector: Selector::placeholder("What needs"),
                    nth: None,
                },
            ];
            assert_eq!(
                describe_chain(&chain),
                r#"css=.todo-list li >> nth=-1 >> placeholder="What needs"i"#
            );
        }

        #[test]
        fn test_action_classification() {
            assert!(DomOp::Click.is_action());
            assert!(DomOp::Fill { value: String::new() }.is_action());
            assert!(!DomOp::IsVisible.is_action());
            assert!(!DomOp::Count.is_action());
        }

        #[test]
        fn test_bounding_box_center() {
            let bb = BoundingBox::from_value(json!({"x": 10.0, "y": 20.0, "width": 100.0, "height": 40.0}))
                .unwrap();
            assert_eq!(bb.center(), (60.0, 40.0));
        }
    }
}
