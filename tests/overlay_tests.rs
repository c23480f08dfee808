//! Overlay behaviour across sites, principals and stores
//!
//! Exercises the public library API the way a host would: build an overlay
//! per site, render, save and resolve.

mod common;

use std::sync::Arc;

use proptest::prelude::*;
use scraper::{Html, Selector};
use tempfile::TempDir;

use common::{overlay_on, TestHost};
use site_author::config::OverlaySettings;
use site_author::host::{
    AttributeStore, MemoryAttributeStore, ProfileSanitizer, Role, RoleAuthorizer, Sanitizer,
    TomlAttributeStore,
};
use site_author::overlay::{ProfileSubmission, SiteOverlay};
use site_author::types::{OverrideField, UserId};
use site_author::{Error, ProfileScreen, SaveOrigin, SiteAuthorPlugin};

const JANE: UserId = UserId::new(7);

// ─────────────────────────────────────────────────────────────────
// Scenarios
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_no_override_yields_global_name() {
    let host = TestHost::new();
    let overlay = host.overlay(3);

    assert_eq!(overlay.resolve_display_name("Jane Doe", Some(JANE)), "Jane Doe");
}

#[test]
fn test_override_applies_only_to_its_site() {
    let host = TestHost::new();
    let site3 = host.overlay(3);
    let site5 = host.overlay(5);

    site3
        .save(JANE, &site3.prepare_submission(Some("J. Doe (Site 3)"), None))
        .unwrap();

    assert_eq!(site3.resolve_display_name("Jane Doe", Some(JANE)), "J. Doe (Site 3)");
    assert_eq!(site5.resolve_display_name("Jane Doe", Some(JANE)), "Jane Doe");
}

#[test]
fn test_biography_override() {
    let host = TestHost::new();
    let overlay = host.overlay(3);

    overlay
        .save(JANE, &overlay.prepare_submission(None, Some("Covers local politics.\r\n")))
        .unwrap();

    assert_eq!(
        overlay.resolve_description("Global bio", Some(JANE)),
        "Covers local politics."
    );
    assert_eq!(overlay.resolve_description("Global bio", Some(UserId::new(8))), "Global bio");
}

#[test]
fn test_missing_subject_returns_base() {
    let host = TestHost::with_store(
        MemoryAttributeStore::new().with_attribute(JANE, "override_display_name_3", "J. Doe"),
    );
    let overlay = host.overlay(3);

    assert_eq!(overlay.resolve_display_name("Anonymous", None), "Anonymous");
    assert_eq!(overlay.resolve_description("", None), "");
}

// ─────────────────────────────────────────────────────────────────
// Gates
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_permission_gate_leaves_every_site_untouched() {
    let host = TestHost::with_store(
        MemoryAttributeStore::new()
            .with_attribute(JANE, "override_display_name_3", "Three")
            .with_attribute(JANE, "override_display_name_5", "Five"),
    );
    let before = host.store.attributes_of(JANE);

    let other_author = host.acting_as(Arc::new(RoleAuthorizer::new(
        Some(UserId::new(8)),
        Role::Author,
    )));
    for site in [3, 5] {
        let overlay = overlay_on(&other_author, site);
        let submission = overlay.prepare_submission(Some("Hijacked"), Some("Hijacked"));
        let err = overlay.save(JANE, &submission).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }

    assert_eq!(host.store.attributes_of(JANE), before);
}

#[test]
fn test_author_may_edit_self() {
    let host = TestHost::new();
    let me = host.acting_as(Arc::new(RoleAuthorizer::new(Some(JANE), Role::Author)));
    let overlay = overlay_on(&me, 3);

    let saved = overlay
        .save(JANE, &overlay.prepare_submission(Some("Jane"), None))
        .unwrap();
    assert_eq!(saved.display_name, "Jane");
}

#[test]
fn test_missing_or_bad_token_writes_nothing() {
    let host = TestHost::new();
    let overlay = host.overlay(3);

    let no_token = ProfileSubmission::new().with_field("override_display_name_3", "X");
    let empty_token = no_token
        .clone()
        .with_field(overlay.nonce_field(), "");
    let bad_token = no_token
        .clone()
        .with_field(overlay.nonce_field(), "deadbeef.cafe");

    for submission in [no_token, empty_token, bad_token] {
        let err = overlay.save(JANE, &submission).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest { .. }));
    }
    assert!(host.store.is_empty());
}

#[test]
fn test_token_cannot_be_replayed() {
    let host = TestHost::new();
    let overlay = host.overlay(3);
    let submission = overlay.prepare_submission(Some("First"), None);

    overlay.save(JANE, &submission).unwrap();
    let err = overlay.save(JANE, &submission).unwrap_err();
    assert!(matches!(err, Error::InvalidRequest { .. }));
}

#[test]
fn test_token_from_rendered_form_is_accepted() {
    let host = TestHost::new();
    let overlay = host.overlay(3);
    let form = overlay.render_fields(JANE).unwrap();

    let body = format!(
        "{}={}&override_display_name_3=J.+Doe&override_description_3=",
        form.nonce_field, form.nonce
    );
    let saved = overlay
        .save(JANE, &ProfileSubmission::from_urlencoded(&body))
        .unwrap();

    assert_eq!(saved.display_name, "J. Doe");
    assert_eq!(saved.description, "");
}

// ─────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_form_never_shows_other_site_values() {
    let host = TestHost::with_store(
        MemoryAttributeStore::new().with_attribute(JANE, "override_display_name_5", "Five"),
    );
    let form = host.overlay(3).render_fields(JANE).unwrap();

    assert_eq!(form.value(OverrideField::DisplayName), "");
    assert_eq!(form.fields.len(), 2);
    assert!(!form.to_html().unwrap().contains("Five"));
}

#[test]
fn test_custom_prefix_keys() {
    let host = TestHost::new();
    let settings = OverlaySettings {
        key_prefix: "ima_".to_string(),
        ..Default::default()
    };
    let overlay = SiteOverlay::new(common::site(3), &settings, host.host.clone());

    overlay
        .save(JANE, &overlay.prepare_submission(Some("Custom"), None))
        .unwrap();

    let attrs = host.store.attributes_of(JANE);
    assert_eq!(attrs.get("ima_display_name_3").map(String::as_str), Some("Custom"));
    assert!(!attrs.contains_key("override_display_name_3"));
}

#[test]
fn test_escaped_markup_resolves_escaped() {
    let host = TestHost::new();
    let overlay = host.overlay(3);

    overlay
        .save(
            JANE,
            &overlay.prepare_submission(Some("&lt;script&gt;alert(1)&lt;/script&gt;"), None),
        )
        .unwrap();

    let resolved = overlay.resolve_display_name("Jane Doe", Some(JANE));
    assert_eq!(resolved, "&lt;script&gt;alert(1)&lt;/script&gt;");
    assert!(!resolved.contains('<'));
}

/// Post the rendered form back exactly as a browser would
fn resubmit(html: &str) -> ProfileSubmission {
    let doc = Html::parse_fragment(html);
    let inputs = Selector::parse("input[name]").unwrap();
    let textareas = Selector::parse("textarea[name]").unwrap();

    let mut pairs = Vec::new();
    for el in doc.select(&inputs) {
        let name = el.value().attr("name").unwrap_or_default();
        let value = el.value().attr("value").unwrap_or_default();
        pairs.push((name.to_string(), value.to_string()));
    }
    for el in doc.select(&textareas) {
        let name = el.value().attr("name").unwrap_or_default();
        pairs.push((name.to_string(), el.text().collect::<String>()));
    }
    ProfileSubmission::from_pairs(pairs)
}

#[test]
fn test_resaving_rendered_form_keeps_overrides() {
    let host = TestHost::new();
    let overlay = host.overlay(3);
    overlay
        .save(
            JANE,
            &overlay.prepare_submission(
                Some("&amp;lt;b&amp;gt;hi&amp;lt;/b&amp;gt;"),
                Some("Tom & Jerry <em>fan</em>"),
            ),
        )
        .unwrap();
    let before = overlay.overrides_for(JANE).unwrap();

    for _ in 0..3 {
        let html = overlay.render_fields(JANE).unwrap().to_html().unwrap();
        overlay.save(JANE, &resubmit(&html)).unwrap();
        assert_eq!(overlay.overrides_for(JANE).unwrap(), before);
    }
    assert_eq!(
        overlay.resolve_display_name("Jane Doe", Some(JANE)),
        "&amp;lt;b&amp;gt;hi&amp;lt;/b&amp;gt;"
    );
    assert_eq!(
        overlay.resolve_description("", Some(JANE)),
        "Tom &amp; Jerry fan"
    );
}

// ─────────────────────────────────────────────────────────────────
// Persistence
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_file_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("attributes.toml");

    {
        let store = Arc::new(TomlAttributeStore::open(&path).unwrap());
        let host = TestHost::new();
        let services = site_author::host::HostServices {
            store,
            ..host.host.clone()
        };
        let overlay = overlay_on(&services, 3);
        overlay
            .save(JANE, &overlay.prepare_submission(Some("On disk"), Some("Bio")))
            .unwrap();
    }

    let reopened = TomlAttributeStore::open(&path).unwrap();
    assert_eq!(
        reopened
            .read_attribute(JANE, "override_display_name_3")
            .unwrap()
            .as_deref(),
        Some("On disk")
    );
}

// ─────────────────────────────────────────────────────────────────
// Plugin Surface
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_plugin_round_trip() {
    let host = TestHost::new();
    let plugin = SiteAuthorPlugin::activate(
        true,
        common::site(3),
        &OverlaySettings::default(),
        host.host.clone(),
    );

    let overlay = plugin.overlay().unwrap();
    let submission = overlay.prepare_submission(Some("<em>J.</em> Doe"), Some("Bio"));
    plugin.on_profile_update(SaveOrigin::PersonalOptions, JANE, &submission);

    assert_eq!(plugin.filter_author_display_name("Jane Doe", Some(JANE)), "J. Doe");
    let html = plugin.render_profile_fields(ProfileScreen::OwnProfile, JANE);
    assert!(html.contains(r#"value="J. Doe""#));
}

#[test]
fn test_plugin_swallows_rejected_save() {
    let host = TestHost::new();
    let denied = host.acting_as(Arc::new(|_: UserId| false));
    let plugin =
        SiteAuthorPlugin::activate(true, common::site(3), &OverlaySettings::default(), denied);

    let submission = plugin
        .overlay()
        .unwrap()
        .prepare_submission(Some("Nope"), None);
    plugin.on_profile_update(SaveOrigin::AdminEdit, JANE, &submission);

    assert!(host.store.is_empty());
}

// ─────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────

fn field_value() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[A-Za-z .()'-]{1,24}",
        "[a-z <>/&;]{1,24}",
        entity_soup(),
    ]
}

/// Text mixed with tags and (doubly) escaped entities
fn entity_soup() -> impl Strategy<Value = String> {
    let part = prop_oneof![
        Just("&lt;".to_string()),
        Just("&gt;".to_string()),
        Just("&amp;".to_string()),
        Just("&amp;lt;".to_string()),
        Just("&amp;gt;".to_string()),
        Just("&nbsp;".to_string()),
        Just("<b>".to_string()),
        Just("</b>".to_string()),
        Just("<script>x</script>".to_string()),
        "[A-Za-z &<>\n]{1,6}",
    ];
    prop::collection::vec(part, 1..10).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn prop_writes_do_not_leak_across_sites(
        user in 1u64..50,
        s1 in 1u64..20,
        offset in 1u64..20,
        value in field_value(),
        existing in "[A-Za-z]{1,12}",
    ) {
        let s2 = s1 + offset;
        let user = UserId::new(user);
        let host = TestHost::with_store(MemoryAttributeStore::new().with_attribute(
            user,
            &format!("override_display_name_{}", s2),
            &existing,
        ));
        let first = host.overlay(s1);
        let second = host.overlay(s2);

        let before = second.overrides_for(user).unwrap();
        first.save(user, &first.prepare_submission(Some(value.as_str()), Some(value.as_str()))).unwrap();

        prop_assert_eq!(second.overrides_for(user).unwrap(), before);
        prop_assert_eq!(second.resolve_display_name("Base", Some(user)), existing);
    }

    #[test]
    fn prop_empty_override_equals_no_override(
        user in 1u64..50,
        site in 1u64..20,
        base in "[A-Za-z ]{0,16}",
    ) {
        let user = UserId::new(user);
        let written = TestHost::new();
        let untouched = TestHost::new();

        let overlay = written.overlay(site);
        overlay.save(user, &overlay.prepare_submission(Some(""), Some(""))).unwrap();
        let fresh = untouched.overlay(site);

        for field in OverrideField::all() {
            prop_assert_eq!(
                overlay.resolve(*field, &base, Some(user)),
                fresh.resolve(*field, &base, Some(user))
            );
            prop_assert_eq!(
                overlay.read_override(user, *field).unwrap(),
                fresh.read_override(user, *field).unwrap()
            );
        }
    }

    #[test]
    fn prop_render_shows_sanitized_value(
        display_name in field_value(),
        description in field_value(),
    ) {
        let host = TestHost::new();
        let overlay = host.overlay(3);
        overlay
            .save(JANE, &overlay.prepare_submission(Some(display_name.as_str()), Some(description.as_str())))
            .unwrap();

        let form = overlay.render_fields(JANE).unwrap();
        let sanitizer = ProfileSanitizer::new();
        prop_assert_eq!(
            form.value(OverrideField::DisplayName),
            sanitizer.sanitize(OverrideField::DisplayName, &display_name)
        );
        prop_assert_eq!(
            form.value(OverrideField::Description),
            sanitizer.sanitize(OverrideField::Description, &description)
        );
    }

    #[test]
    fn prop_sanitizer_is_idempotent(raw in field_value()) {
        let sanitizer = ProfileSanitizer::new();
        for field in OverrideField::all() {
            let once = sanitizer.sanitize(*field, &raw);
            prop_assert_eq!(&sanitizer.sanitize(*field, &once), &once);
        }
    }

    #[test]
    fn prop_resaved_form_is_unchanged(
        display_name in field_value(),
        description in field_value(),
    ) {
        let host = TestHost::new();
        let overlay = host.overlay(3);
        overlay
            .save(JANE, &overlay.prepare_submission(Some(display_name.as_str()), Some(description.as_str())))
            .unwrap();
        let before = overlay.overrides_for(JANE).unwrap();

        let html = overlay.render_fields(JANE).unwrap().to_html().unwrap();
        overlay.save(JANE, &resubmit(&html)).unwrap();
        prop_assert_eq!(overlay.overrides_for(JANE).unwrap(), before);
    }

    #[test]
    fn prop_resolution_is_idempotent(
        value in field_value(),
        base in "[A-Za-z ]{0,16}",
    ) {
        let host = TestHost::new();
        let overlay = host.overlay(3);
        overlay.save(JANE, &overlay.prepare_submission(Some(value.as_str()), None)).unwrap();

        let once = overlay.resolve_display_name(&base, Some(JANE));
        let twice = overlay.resolve_display_name(&base, Some(JANE));
        prop_assert_eq!(&once, &twice);
        prop_assert!(host.store.len() == 2);
    }
}
