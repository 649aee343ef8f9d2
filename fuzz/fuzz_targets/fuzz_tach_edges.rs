#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|ticks: Vec<u32>| {
    let tach = fanctl_core::TachometerEstimator::new();
    for t in ticks {
        if let Some(rpm) = tach.on_pulse(t) {
            assert!(rpm.is_finite() && rpm > 0.0);
        }
    }
    assert!(tach.read_rpm().is_finite());
});
