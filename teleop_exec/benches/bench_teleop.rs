//! # Teleoperation Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use teleop_lib::{
    analog::{AnalogSource, SimAnalogSource},
    teleop_ctrl::{self, InputData, Params, TeleopCtrl},
};
use util::module::State;

fn teleop_benchmark(c: &mut Criterion) {
    let params = Params {
        raw_min: 80,
        raw_max: 950,
        alpha: 0.8,
        deadband_deg: 1,
    };

    // Pure conditioning of a single reading
    c.bench_function("teleop_ctrl::rescale+to_angle_deg", |b| {
        b.iter(|| teleop_ctrl::to_angle_deg(teleop_ctrl::rescale(black_box(612), &params)))
    });

    // Full cycles fed by the sweeping source
    let mut ctrl = TeleopCtrl::default();
    ctrl.init(params).unwrap();
    let mut source = SimAnalogSource::new(4);

    c.bench_function("TeleopCtrl::proc", |b| {
        b.iter(|| {
            let raw = source.sample().unwrap().unwrap();
            ctrl.proc(&InputData { raw }).unwrap()
        })
    });
}

criterion_group!(benches, teleop_benchmark);
criterion_main!(benches);
