use approx::assert_relative_eq;

use aevkit::{AevCalculator, Backend, ElementTable, Vector3D};
use aevkit::systems::read_vasprun;

mod data;

#[test]
fn converged_steps() {
    let records = read_vasprun("tests/data/vasprun.xml").expect("failed to read vasprun.xml");

    // the second ionic step used all NELM=4 electronic steps
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].energy, -10.84410017);
    assert_eq!(records[1].energy, -10.83012);

    for record in &records {
        assert_eq!(record.symbols, ["Si", "Si"]);
        assert_eq!(record.cell[0], [0.0, 2.715, 2.715]);
    }

    // fractional positions are converted to cartesian
    assert_relative_eq!(records[0].positions[1], Vector3D::new(1.3575, 1.3575, 1.3575), epsilon = 1e-12);
    assert_relative_eq!(records[1].positions[0], Vector3D::new(0.0, 0.002 * 2.715, 0.002 * 2.715), epsilon = 1e-12);
    assert_eq!(records[1].forces[0], Vector3D::new(0.03424, -0.006, -0.006));
}

#[test]
fn training_systems() {
    let records = read_vasprun("tests/data/vasprun.xml").unwrap();
    let elements = ElementTable::new(&["Si"]).unwrap();

    let systems = records.iter()
        .map(|record| record.to_system(&elements))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    let calculator = AevCalculator::<f64>::from_json(1, data::PARAMETERS).unwrap();
    let aev = calculator.compute_systems(&systems, Backend::Serial).unwrap();
    assert_eq!(aev.shape(), [4, calculator.size()]);

    // both atoms of perfect diamond have the same environment
    assert_relative_eq!(aev.row(0), aev.row(1), max_relative = 1e-10);
    assert!(aev.row(0).iter().any(|&v| v > 0.0));

    // the distorted structure does not
    assert!(aev.row(0).iter().zip(aev.row(2)).any(|(a, b)| (a - b).abs() > 1e-6));
}

#[test]
fn missing_file() {
    let error = read_vasprun("tests/data/not-there.xml").unwrap_err();
    assert!(matches!(error, aevkit::Error::Io(_)));
}
