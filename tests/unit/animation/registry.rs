use super::*;

#[test]
fn builtin_round_trips_ids() {
    let reg = EasingRegistry::builtin();
    assert_eq!(reg.len(), 9);
    assert_eq!(reg.get(EaseId(30)), Some(Ease::Cubic));
    assert_eq!(reg.get(EaseId(9999)), None);
    for (id, ease) in reg.iter() {
        assert_eq!(ease.id(), id);
    }
}

#[test]
fn get_or_substitutes_default() {
    let reg = EasingRegistry::builtin();
    assert_eq!(reg.get_or(EaseId(9999), Ease::Linear), Ease::Linear);
    assert_eq!(reg.get_or(EaseId(20), Ease::Linear), Ease::Quadratic);
}

#[test]
fn by_name_is_case_insensitive() {
    let reg = EasingRegistry::builtin();
    assert_eq!(reg.by_name(" Cubic "), Some(Ease::Cubic));
    assert_eq!(reg.by_name("elastic"), Some(Ease::ELASTIC));
    assert_eq!(reg.by_name("bounce"), None);
}

#[test]
fn sinusoidal_names_the_sine_family() {
    let reg = EasingRegistry::builtin();
    assert_eq!(reg.by_name("sinusoidal"), Some(Ease::Sine));
    assert_eq!(reg.by_name("Sinusoidal"), reg.by_name("sine"));
}

#[test]
fn register_rejects_duplicates() {
    let mut reg = EasingRegistry::builtin();
    let err = reg.register(EaseId(30), Ease::Linear).unwrap_err();
    assert!(matches!(err, SlidecastError::Animation(_)), "{err:?}");

    let springy = Ease::Elastic {
        amplitude: 1.5,
        oscillations: 5.0,
    };
    reg.register(EaseId(91), springy).unwrap();
    assert_eq!(reg.get(EaseId(91)), Some(springy));
    assert_eq!(reg.get(EaseId(30)), Some(Ease::Cubic));
}

#[test]
fn ease_id_serializes_as_integer() {
    assert_eq!(serde_json::to_string(&EaseId(30)).unwrap(), "30");
    let id: EaseId = serde_json::from_str("70").unwrap();
    assert_eq!(id, EaseId(70));
}

#[test]
fn register_rejects_non_finite_elastic() {
    let mut reg = EasingRegistry::empty();
    let broken = Ease::Elastic {
        amplitude: f64::NAN,
        oscillations: 3.0,
    };
    let err = reg.register(EaseId(95), broken).unwrap_err();
    assert!(matches!(err, SlidecastError::Animation(_)), "{err:?}");
    assert!(reg.is_empty());
}
