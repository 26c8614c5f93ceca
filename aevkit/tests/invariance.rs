use approx::assert_relative_eq;
use ndarray::Array2;

use aevkit::{AevCalculator, AtomicSystem, Backend, Vector3D};

mod data;

fn compute(calculator: &AevCalculator<f64>, system: AtomicSystem) -> Array2<f64> {
    return calculator.compute_systems(&[system], Backend::Serial).expect("failed to compute AEV");
}

#[test]
fn translation() {
    let calculator = AevCalculator::<f64>::from_json(3, data::PARAMETERS).unwrap();

    for system in data::all_systems() {
        let reference = compute(&calculator, system.clone());

        let mut translated = system;
        translated.translate(Vector3D::new(1.3, -7.2, 22.5));
        let aev = compute(&calculator, translated);

        assert_relative_eq!(aev, reference, epsilon = 1e-10, max_relative = 1e-8);
    }
}

#[test]
fn rotation() {
    let calculator = AevCalculator::<f64>::from_json(3, data::PARAMETERS).unwrap();

    for system in data::all_systems() {
        let reference = compute(&calculator, system.clone());

        for (axis, angle) in [
            (Vector3D::new(0.0, 0.0, 1.0), 0.3),
            (Vector3D::new(1.0, -2.0, 0.5), 2.1),
            (Vector3D::new(-1.0, 1.0, 1.0), -4.0),
        ] {
            let mut rotated = system.clone();
            rotated.rotate(data::rotation(axis, angle)).unwrap();
            let aev = compute(&calculator, rotated);

            assert_relative_eq!(aev, reference, epsilon = 1e-10, max_relative = 1e-8);
        }
    }
}

#[test]
fn atoms_in_other_periodic_images() {
    let calculator = AevCalculator::<f64>::from_json(3, data::PARAMETERS).unwrap();

    let system = data::methanol();
    let reference = compute(&calculator, system.clone());

    // moving an atom by a lattice vector does not change anything
    let mut moved = system;
    let lattice = moved.cell().matrix();
    moved.positions_mut()[2] += Vector3D::from(lattice[1]) - Vector3D::from(lattice[0]) * 2.0;
    let aev = compute(&calculator, moved);

    assert_relative_eq!(aev, reference, epsilon = 1e-10, max_relative = 1e-8);
}

#[test]
fn serial_and_parallel() {
    let calculator = AevCalculator::<f64>::from_json(3, data::PARAMETERS).unwrap();
    let systems = data::all_systems();

    let serial = calculator.compute_systems(&systems, Backend::Serial).unwrap();
    let parallel = calculator.compute_systems(&systems, Backend::Parallel).unwrap();

    assert_eq!(serial, parallel);
}

#[test]
fn single_and_double_precision() {
    let systems = data::all_systems();

    let double = AevCalculator::<f64>::from_json(3, data::PARAMETERS).unwrap();
    let single = AevCalculator::<f32>::from_json(3, data::PARAMETERS).unwrap();

    let double = double.compute_systems(&systems, Backend::Serial).unwrap();
    let single = single.compute_systems(&systems, Backend::Parallel).unwrap();

    assert_eq!(single.shape(), double.shape());
    for (&single, &double) in single.iter().zip(&double) {
        assert_relative_eq!(single as f64, double, epsilon = 1e-5, max_relative = 1e-4);
    }
}
