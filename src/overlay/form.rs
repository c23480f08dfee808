//! Profile-edit form fields
//!
//! The form is built as a structured value first so hosts that render their
//! own markup can use it directly. `to_html` renders the same value through
//! an autoescaping template; nothing user-controlled reaches the markup
//! unescaped.

use minijinja::Environment;
use serde::Serialize;

use crate::error::Result;
use crate::types::{OverrideField, Site, SiteId, UserId};

/// Template name; the `.html` suffix turns on HTML autoescaping
const TEMPLATE_NAME: &str = "profile_fields.html";

const TEMPLATE: &str = r#"<input type="hidden" name="{{ nonce_field }}" value="{{ nonce }}" />
<h3>{{ heading }}</h3>
<table class="form-table">
{%- for f in fields %}
  <tr>
    <th><label for="{{ f.id }}">{{ f.label }}</label></th>
    <td>
    {%- if f.multiline %}
      <textarea name="{{ f.name }}" id="{{ f.id }}" rows="5" cols="30">{{ f.value }}</textarea>
    {%- else %}
      <input type="text" name="{{ f.name }}" id="{{ f.id }}" value="{{ f.value }}" class="regular-text" />
    {%- endif %}
      <p class="description">{{ f.help }}</p>
    </td>
  </tr>
{%- endfor %}
</table>
"#;

const HEADING: &str = "Site-specific author information";

/// One input control on the profile-edit page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub field: OverrideField,
    /// Posted field name (the storage key for the active site)
    pub name: String,
    /// DOM id
    pub id: &'static str,
    pub label: &'static str,
    pub help: String,
    /// Current override, empty if none
    pub value: String,
    pub multiline: bool,
}

impl FormField {
    pub(crate) fn new(field: OverrideField, name: &str, site: &Site, value: String) -> Self {
        let help = match field {
            OverrideField::DisplayName => format!("Display name for {}", site.base_url),
            OverrideField::Description => format!("Biography for {}", site.base_url),
        };

        Self {
            field,
            name: name.to_string(),
            id: field.element_id(),
            label: field.label(),
            help,
            value,
            multiline: matches!(field, OverrideField::Description),
        }
    }
}

/// The override fields injected into a profile-edit page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileForm {
    pub user_id: UserId,
    pub site_id: SiteId,
    pub heading: &'static str,
    /// Hidden field carrying the anti-forgery token
    pub nonce_field: String,
    pub nonce: String,
    pub fields: Vec<FormField>,
}

impl ProfileForm {
    pub(crate) fn new(
        user_id: UserId,
        site_id: SiteId,
        nonce_field: &str,
        nonce: String,
        fields: Vec<FormField>,
    ) -> Self {
        Self {
            user_id,
            site_id,
            heading: HEADING,
            nonce_field: nonce_field.to_string(),
            nonce,
            fields,
        }
    }

    pub fn field(&self, field: OverrideField) -> Option<&FormField> {
        self.fields.iter().find(|f| f.field == field)
    }

    /// Pre-filled value of `field`, empty if the form lacks it
    pub fn value(&self, field: OverrideField) -> &str {
        self.field(field).map(|f| f.value.as_str()).unwrap_or("")
    }

    /// Render the fields as HTML markup
    pub fn to_html(&self) -> Result<String> {
        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, TEMPLATE)?;
        let html = env.get_template(TEMPLATE_NAME)?.render(self)?;
        Ok(html)
    }
}
