use approx::assert_relative_eq;
use ndarray::{s, Array1, Array2, ArrayD};

use aevkit::{AevCalculator, AtomicSystem, Backend, Batch};
use aevkit::{FlattenedForm, ParallelForm, SeriesForm};
use aevkit::model::{Activation, AtomicNetwork, DenseLayer, ElementNetworks, EnergyModel, EnergyShifter};

mod data;

fn positions(system: &AtomicSystem) -> ArrayD<f64> {
    let positions = system.positions();
    return Array2::from_shape_fn((system.size(), 3), |(i, a)| positions[i][a]).into_dyn();
}

#[test]
fn batch_forms_round_trips() {
    let list = data::all_systems().iter().map(positions).collect::<Vec<_>>();

    let series = SeriesForm::from_list(&list).unwrap();
    assert_eq!(series.data().shape(), [3 + 6 + 6 + 2, 3]);
    assert_eq!(series.to_list().unwrap(), list);

    for padding in [0.0, -1.0, 1e20, f64::NAN] {
        let parallel = ParallelForm::from_list(&list, padding).unwrap();
        assert_eq!(parallel.data().shape(), [4, 6, 3]);
        assert_eq!(parallel.to_list().unwrap(), list);

        let flattened = FlattenedForm::from_parallel(&parallel).unwrap();
        assert_eq!(flattened.data().shape(), [24, 3]);
        assert_eq!(flattened.to_list().unwrap(), list);

        assert_eq!(SeriesForm::from_parallel(&parallel).unwrap(), series);
        assert_eq!(SeriesForm::from_flattened(&flattened).unwrap(), series);

        let parallel = ParallelForm::from_series(&series, padding).unwrap();
        assert_eq!(parallel.to_list().unwrap(), list);
    }
}

#[test]
fn batched_and_single_systems() {
    let calculator = AevCalculator::<f64>::from_json(3, data::PARAMETERS).unwrap();
    let systems = data::all_systems();

    let batched = calculator.compute_systems(&systems, Backend::Parallel).unwrap();

    let mut start = 0;
    for system in systems {
        let size = system.size();
        let single = calculator.compute_systems(&[system], Backend::Serial).unwrap();
        assert_eq!(batched.slice(s![start..start + size, ..]), single);
        start += size;
    }
    assert_eq!(start, batched.nrows());
}

#[test]
fn batch_from_series() {
    let systems = data::all_systems();
    let from_systems = Batch::from_systems(&systems).unwrap();

    let batch = Batch::new(
        from_systems.cells().clone(),
        from_systems.positions().to_owned(),
        from_systems.species().to_owned(),
        from_systems.affiliation().to_owned(),
    ).unwrap();

    let calculator = AevCalculator::<f32>::from_json(3, data::PARAMETERS).unwrap();
    assert_eq!(
        calculator.compute(&batch, Backend::Serial).unwrap(),
        calculator.compute(&from_systems, Backend::Serial).unwrap(),
    );

    // non contiguous affiliation
    let mut affiliation = from_systems.affiliation().to_owned();
    affiliation[0] = 1;
    let error = Batch::new(
        from_systems.cells().clone(),
        from_systems.positions().to_owned(),
        from_systems.species().to_owned(),
        affiliation,
    ).unwrap_err();
    assert!(error.to_string().contains("affiliation"));
}

fn energy_model() -> EnergyModel<f64> {
    let calculator = AevCalculator::<f64>::from_json(3, data::PARAMETERS).unwrap();
    let size = calculator.size();

    let networks = (0..3).map(|species| {
        let hidden = DenseLayer::new(
            Array2::from_shape_fn((8, size), |(i, j)| 0.1 * f64::cos((7 * i + j + 3 * species) as f64)),
            Array1::from_shape_fn(8, |i| 0.01 * i as f64),
        ).unwrap();
        let output = DenseLayer::new(
            Array2::from_shape_fn((1, 8), |(_, j)| f64::sin(j as f64)),
            Array1::from_elem(1, 0.3),
        ).unwrap();
        AtomicNetwork::new(vec![hidden, output], Activation::celu(0.1).unwrap()).unwrap()
    }).collect();

    let networks = ElementNetworks::new(networks).unwrap();
    let shifter = EnergyShifter::new(Array1::from(vec![-0.6, -38.0, -75.1]), -0.2).unwrap();
    return EnergyModel::new(calculator, networks, shifter).unwrap();
}

#[test]
fn energy_additivity() {
    let model = energy_model();
    let systems = data::all_systems();

    let batch = Batch::from_systems(&systems).unwrap();
    let energies = model.energies(&batch, Backend::Parallel).unwrap();
    assert_eq!(energies.len(), systems.len());

    for (system, &energy) in systems.iter().zip(&energies) {
        let single = Batch::from_systems(std::slice::from_ref(system)).unwrap();
        let expected = model.energies(&single, Backend::Serial).unwrap();
        assert_relative_eq!(energy, expected[0], max_relative = 1e-12);
    }
}

#[test]
fn fitted_shifter() {
    let systems = data::all_systems();
    let batch = Batch::from_systems(&systems).unwrap();
    let composition = aevkit::model::composition(&batch, 3).unwrap();

    let reference = EnergyShifter::new(Array1::from(vec![-0.6, -38.0, -75.1]), -0.2).unwrap();
    let energies = reference.energies(&batch).unwrap();

    // water, methanol, CO2 and diamond compositions are linearly
    // independent, with the intercept there are exactly as many unknowns as
    // systems
    let fitted = EnergyShifter::fit(composition.view(), energies.view()).unwrap();
    assert_relative_eq!(fitted.energies(&batch).unwrap(), energies, max_relative = 1e-10);
}
