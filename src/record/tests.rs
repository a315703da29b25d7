use super::*;

#[test]
fn test_value_coercions() {
    assert_eq!(Value::from(3i16).as_f64(), Some(3.0));
    assert_eq!(Value::from(2.75f64).as_i64(), Some(2));
    assert_eq!(Value::from("abc").as_str(), Some("abc"));
    assert_eq!(Value::from("abc").as_f64(), None);
    assert_eq!(Value::from(1.5f32).to_string(), "1.5");
}

#[test]
fn test_push_epoch_keeps_nobs_in_step() {
    let mut event = SnEvent::new("SN001");
    event.push_epoch(FieldBag::new().with("MJD", 60000.0));
    event.push_epoch(FieldBag::new().with("MJD", 60001.0));
    event.epochs.push(Epoch::skipped(FieldBag::new().with("MJD", 60002.0)));

    assert_eq!(event.declared_nobs(), 2);
    assert_eq!(event.written_epochs().count(), 2);
    assert_eq!(event.snid(), Some("SN001"));
}

#[test]
fn test_valid_bins_drop_non_positive_errors() {
    let mut spectrum = SpectrumEpoch::new(60000.5);
    spectrum.push_bin(0, 1.0, 0.1);
    spectrum.push_bin(1, 2.0, 0.0);
    spectrum.push_bin(2, 3.0, -1.0);
    spectrum.push_bin(3, 4.0, 0.2).set("SIM_FLAM", 4.5f32);

    let kept: Vec<_> = spectrum
        .valid_bins()
        .filter_map(|b| b.i64("LAMINDEX"))
        .collect();
    assert_eq!(kept, vec![0, 3]);
    assert_eq!(spectrum.bins[3].f64("SIM_FLAM"), Some(4.5));
}
