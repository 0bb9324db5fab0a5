use super::session::CalculatorSession;
use super::types::{Command, Component, Effect, NoticeKind};
use crate::fields::FieldKind;
use crate::persistence::{KeyValueStore, MemoryStore};
use crate::units::DimensionUnit;

fn edit(field: FieldKind, raw: &str) -> Command {
    Command::Edit {
        field,
        component: Component::Main,
        raw: raw.to_string(),
    }
}

fn new_session() -> CalculatorSession<MemoryStore> {
    CalculatorSession::new(MemoryStore::new())
}

#[test]
fn test_edits_recompute_totals() {
    let mut session = new_session();
    session.handle(edit(FieldKind::Thickness, "1"));
    session.handle(edit(FieldKind::Width, "6"));
    let effects = session.handle(edit(FieldKind::Length, "8"));

    assert!((session.state().total_volume - 4.0).abs() < 1e-9);
    assert!(effects.contains(&Effect::FieldComputed {
        field: FieldKind::TotalVolume,
        display: "4.00".to_string(),
    }));

    let effects = session.handle(edit(FieldKind::Price, "2.50"));
    assert!((session.state().total_cost - 10.0).abs() < 1e-9);
    assert!(effects.contains(&Effect::FieldComputed {
        field: FieldKind::TotalCost,
        display: "10.00".to_string(),
    }));
}

#[test]
fn test_invalid_edit_coerces_to_zero() {
    let mut session = new_session();
    session.handle(edit(FieldKind::Width, "6"));
    session.handle(edit(FieldKind::Width, "not a number"));
    assert_eq!(session.state().width.main, 0.0);
}

#[test]
fn test_negative_dimension_clamped() {
    let mut session = new_session();
    session.handle(edit(FieldKind::Thickness, "-3"));
    assert_eq!(session.state().thickness.main, 0.0);
}

#[test]
fn test_fraction_edit_requires_composite_unit() {
    let mut session = new_session();
    session.handle(Command::Edit {
        field: FieldKind::Length,
        component: Component::Fraction,
        raw: "6".to_string(),
    });
    // Length is still in plain feet: no fraction input exists
    assert_eq!(session.state().length.fraction, 0.0);

    session.handle(Command::UnitChange {
        field: FieldKind::Length,
        unit: DimensionUnit::FootInch,
    });
    session.handle(Command::Edit {
        field: FieldKind::Length,
        component: Component::Fraction,
        raw: "6".to_string(),
    });
    assert_eq!(session.state().length.fraction, 6.0);
}

#[test]
fn test_unit_change_back_to_simple_zeroes_fraction() {
    let mut session = new_session();
    session.handle(Command::UnitChange {
        field: FieldKind::Length,
        unit: DimensionUnit::FootInch,
    });
    session.handle(Command::Edit {
        field: FieldKind::Length,
        component: Component::Fraction,
        raw: "6".to_string(),
    });
    session.handle(Command::UnitChange {
        field: FieldKind::Length,
        unit: DimensionUnit::Foot,
    });
    assert_eq!(session.state().length.fraction, 0.0);
}

#[test]
fn test_lock_rejected_when_one_field_would_remain() {
    let mut session = new_session();
    for field in FieldKind::ALL.into_iter().take(6) {
        let effects = session.handle(Command::ToggleLock { field });
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::LockChanged { locked: true, .. })));
    }

    let effects = session.handle(Command::ToggleLock {
        field: FieldKind::TotalCost,
    });
    assert!(matches!(effects[0], Effect::Rejected { .. }));
    assert!(matches!(
        effects[1],
        Effect::Notice {
            level: NoticeKind::Warning,
            ..
        }
    ));
    assert!(!session.locks().is_locked(FieldKind::TotalCost));
}

#[test]
fn test_unlock_always_allowed_and_clears_storage() {
    let mut session = new_session();
    session.handle(edit(FieldKind::Width, "6"));
    session.handle(Command::ToggleLock {
        field: FieldKind::Width,
    });
    assert_eq!(session.store().get("bf_calc_width").as_deref(), Some("6"));
    assert_eq!(session.store().get("bf_calc_width_unit").as_deref(), Some("in"));

    let effects = session.handle(Command::ToggleLock {
        field: FieldKind::Width,
    });
    assert!(effects.contains(&Effect::LockChanged {
        field: FieldKind::Width,
        locked: false,
    }));
    assert_eq!(session.store().get("bf_calc_width"), None);
    assert_eq!(session.store().get("bf_calc_width_unit"), None);
}

#[test]
fn test_edit_of_locked_field_autosaves() {
    let mut session = new_session();
    session.handle(Command::ToggleLock {
        field: FieldKind::Price,
    });
    session.handle(edit(FieldKind::Price, "2.5"));
    assert_eq!(session.store().get("bf_calc_price").as_deref(), Some("2.5"));
}

#[test]
fn test_unit_change_of_locked_field_autosaves() {
    let mut session = new_session();
    session.handle(Command::ToggleLock {
        field: FieldKind::Length,
    });
    session.handle(Command::UnitChange {
        field: FieldKind::Length,
        unit: DimensionUnit::FootInch,
    });
    assert_eq!(
        session.store().get("bf_calc_length_unit").as_deref(),
        Some("ft/in")
    );
}

#[test]
fn test_rehydrates_locked_values_from_store() {
    let mut store = MemoryStore::new();
    store.set("bf_calc_thickness", "1");
    store.set("bf_calc_thickness_unit", "in");
    store.set("bf_calc_width", "6");
    store.set("bf_calc_width_unit", "in");
    store.set("bf_calc_length", "8");
    store.set("bf_calc_length_unit", "ft");
    store.set("bf_calc_price", "2.5");

    let session = CalculatorSession::new(store);
    assert!(session.locks().is_locked(FieldKind::Thickness));
    assert!(session.locks().is_locked(FieldKind::Price));
    assert!(!session.locks().is_locked(FieldKind::TotalVolume));
    assert!((session.state().total_volume - 4.0).abs() < 1e-9);
    assert!((session.state().total_cost - 10.0).abs() < 1e-9);
}

#[test]
fn test_fully_locked_save_set_leaves_one_field_free() {
    let mut store = MemoryStore::new();
    for field in FieldKind::ALL {
        store.set(&format!("bf_calc_{}", field.storage_key()), "1");
    }

    let session = CalculatorSession::new(store);
    assert_eq!(session.locks().locked_fields().len(), 6);
    assert!(!session.locks().is_locked(FieldKind::TotalCost));
}

#[test]
fn test_editing_window_shields_the_edited_field() {
    let mut session = new_session();
    // Dimensions are all zero, so a pass would write total volume back to 0;
    // the settle window keeps the user's in-progress value
    session.handle(edit(FieldKind::TotalVolume, "5"));
    assert_eq!(session.state().total_volume, 5.0);

    session.handle(Command::Blur {
        field: FieldKind::TotalVolume,
    });
    session.handle(edit(FieldKind::Pieces, "2"));
    assert_eq!(session.state().total_volume, 0.0);
}

#[test]
fn test_blur_reformats_locked_total() {
    let mut session = new_session();
    session.handle(Command::ToggleLock {
        field: FieldKind::TotalCost,
    });
    session.handle(edit(FieldKind::TotalCost, "1234.5"));
    let effects = session.handle(Command::Blur {
        field: FieldKind::TotalCost,
    });
    assert_eq!(
        effects,
        vec![Effect::FieldComputed {
            field: FieldKind::TotalCost,
            display: "1,234.50".to_string(),
        }]
    );
}

#[test]
fn test_reverse_price_flow_through_session() {
    let mut session = new_session();
    session.handle(edit(FieldKind::Thickness, "1"));
    session.handle(edit(FieldKind::Width, "6"));
    session.handle(edit(FieldKind::Length, "8"));
    session.handle(Command::ToggleLock {
        field: FieldKind::TotalCost,
    });
    session.handle(edit(FieldKind::TotalCost, "15"));
    session.handle(Command::Blur {
        field: FieldKind::TotalCost,
    });
    // Force a fresh pass now that the cost is locked at 15
    session.handle(edit(FieldKind::Pieces, "1"));
    assert!((session.state().price - 3.75).abs() < 1e-9);
}

#[test]
fn test_reset_restores_defaults_and_clears_store() {
    let mut session = new_session();
    session.handle(edit(FieldKind::Width, "6"));
    session.handle(Command::ToggleLock {
        field: FieldKind::Width,
    });
    session.record_feedback(true);

    let effects = session.handle(Command::Reset);
    assert_eq!(session.state().width.main, 0.0);
    assert_eq!(session.state().pieces, 1.0);
    assert!(session.locks().locked_fields().is_empty());
    assert_eq!(session.store().get("bf_calc_width"), None);
    assert_eq!(session.store().get("bf_calc_feedback"), None);
    assert!(matches!(
        effects.last(),
        Some(Effect::Notice {
            level: NoticeKind::Success,
            ..
        })
    ));
}

#[test]
fn test_share_round_trip_between_sessions() {
    let mut session = new_session();
    session.handle(edit(FieldKind::Pieces, "3"));
    session.handle(edit(FieldKind::Thickness, "1.5"));
    session.handle(edit(FieldKind::Width, "6"));
    session.handle(edit(FieldKind::Length, "8"));
    session.handle(edit(FieldKind::Price, "2.5"));

    let query = session.share_query();
    let mut restored = new_session();
    restored.load_share_query(&query);

    assert_eq!(restored.state().pieces, 3.0);
    assert_eq!(restored.state().thickness.main, 1.5);
    assert!((restored.state().total_volume - session.state().total_volume).abs() < 1e-9);
    // Lock state never travels through a share link
    assert!(restored.locks().locked_fields().is_empty());
}

#[test]
fn test_feedback_recorded() {
    let mut session = new_session();
    let effects = session.record_feedback(false);
    assert_eq!(
        session.store().get("bf_calc_feedback").as_deref(),
        Some("negative")
    );
    assert!(matches!(effects[0], Effect::Notice { .. }));
}

#[test]
fn test_persist_locked_rewrites_store() {
    let mut session = new_session();
    session.handle(edit(FieldKind::Price, "4.5"));
    session.handle(Command::ToggleLock {
        field: FieldKind::Price,
    });
    session.handle(edit(FieldKind::Price, "5.5"));

    session.persist_locked();
    assert_eq!(session.store().get("bf_calc_price").as_deref(), Some("5.5"));
}
