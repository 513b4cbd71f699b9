//! Status text and inline control panel rendering

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use url::Url;

use crate::handlers::callbacks::PanelAction;
use crate::i18n::{params, I18n};
use crate::models::{Category, GroupSettings, MediaType, SettingField, TimeSlot};
use crate::utils::helpers::{group_deep_link, status_mark};

/// Interval presets offered on the panel, in minutes
pub const INTERVAL_PRESETS: [i64; 5] = [15, 30, 60, 120, 240];

/// Time presets offered per slot
const TIME_PRESETS: [(TimeSlot, [&str; 3]); 3] = [
    (TimeSlot::Morning, ["04:30", "05:00", "06:00"]),
    (TimeSlot::Evening, ["16:00", "17:00", "18:00"]),
    (TimeSlot::Sleep, ["21:00", "22:00", "23:00"]),
];

fn slot_of(category: Category) -> Option<TimeSlot> {
    match category {
        Category::Morning => Some(TimeSlot::Morning),
        Category::Evening => Some(TimeSlot::Evening),
        Category::Sleep => Some(TimeSlot::Sleep),
        _ => None,
    }
}

/// Human-readable summary of a group's settings
pub fn status_text(i18n: &I18n, settings: &GroupSettings) -> String {
    let mut lines = vec![
        i18n.t("status.title", None),
        i18n.t("status.master", Some(&params([("mark", status_mark(settings.enabled).to_string())]))),
    ];

    for category in Category::ALL {
        let name = i18n.t(&format!("categories.{}", category.as_str()), None);
        let mark = status_mark(settings.is_on(category)).to_string();
        let line = match slot_of(category) {
            Some(slot) => i18n.t(
                "status.feature_at",
                Some(&params([("name", name), ("mark", mark), ("time", settings.time_of(slot).to_string())])),
            ),
            None => i18n.t("status.feature", Some(&params([("name", name), ("mark", mark)]))),
        };
        lines.push(line);
    }

    lines.push(i18n.t(
        "status.interval",
        Some(&params([("minutes", settings.diverse_interval_minutes.to_string())])),
    ));
    lines.push(i18n.t(
        "status.media",
        Some(&params([("media", i18n.t(&format!("media.{}", settings.diverse_media_type.as_str()), None))])),
    ));

    lines.join("\n")
}

/// Panel message body
pub fn panel_text(i18n: &I18n, settings: &GroupSettings) -> String {
    format!("{}\n\n{}", i18n.t("panel.title", None), status_text(i18n, settings))
}

/// Inline control panel.
///
/// `deep_link` is the bot username; when set, a button opening the panel in
/// a private chat is added.
pub fn keyboard(i18n: &I18n, settings: &GroupSettings, deep_link: Option<&str>) -> InlineKeyboardMarkup {
    let group_id = settings.chat_id;
    let button = |text: String, action: PanelAction| InlineKeyboardButton::callback(text, action.encode());
    let toggle = |text: String, field: SettingField| button(text, PanelAction::Toggle { group_id, field });
    let marked = |on: bool, text: String| if on { format!("✅ {}", text) } else { text };

    let mut rows = vec![vec![toggle(
        i18n.t("panel.master", Some(&params([("mark", status_mark(settings.enabled).to_string())]))),
        SettingField::Enabled,
    )]];

    for category in Category::ALL {
        let name = i18n.t(&format!("categories.{}", category.as_str()), None);
        rows.push(vec![toggle(
            format!("{} {}", status_mark(settings.is_on(category)), name),
            category.toggle(),
        )]);
    }

    rows.push(
        INTERVAL_PRESETS
            .iter()
            .map(|minutes| {
                button(
                    marked(
                        *minutes == settings.diverse_interval_minutes,
                        i18n.t("panel.interval", Some(&params([("minutes", minutes.to_string())]))),
                    ),
                    PanelAction::Interval { group_id, minutes: *minutes },
                )
            })
            .collect(),
    );

    rows.push(
        MediaType::ALL
            .iter()
            .map(|media| {
                button(
                    marked(*media == settings.diverse_media_type, i18n.t(&format!("media.{}", media.as_str()), None)),
                    PanelAction::Media { group_id, media: *media },
                )
            })
            .collect(),
    );

    for (slot, presets) in TIME_PRESETS {
        let label = i18n.t(&format!("slots.{}", slot.as_str()), None);
        rows.push(
            presets
                .iter()
                .map(|time| {
                    button(
                        marked(settings.time_of(slot) == *time, format!("{} {}", label, time)),
                        PanelAction::Time { group_id, slot, time: time.to_string() },
                    )
                })
                .collect(),
        );
    }

    rows.push(
        [
            ("panel.media_morning", SettingField::SendMediaWithMorning),
            ("panel.media_evening", SettingField::SendMediaWithEvening),
            ("panel.media_friday", SettingField::SendMediaWithFriday),
        ]
        .into_iter()
        .map(|(key, field)| {
            let on = settings.flag(field).unwrap_or(false);
            toggle(i18n.t(key, Some(&params([("mark", status_mark(on).to_string())]))), field)
        })
        .collect(),
    );

    if let Some(url) = deep_link
        .filter(|username| !username.is_empty())
        .and_then(|username| Url::parse(&group_deep_link(username, group_id)).ok())
    {
        rows.push(vec![InlineKeyboardButton::url(i18n.t("panel.private_button", None), url)]);
    }

    rows.push(vec![
        button(i18n.t("panel.refresh", None), PanelAction::Refresh { group_id }),
        button(i18n.t("panel.close", None), PanelAction::Close { group_id }),
    ]);

    InlineKeyboardMarkup::new(rows)
}
