use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::{Error, Matrix3, Vector3D};
use super::{AtomicSystem, ElementTable, UnitCell};

/// A single converged ionic step of a VASP calculation, usable as training
/// data for an energy model.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    /// Element symbols of all atoms
    pub symbols: Vec<String>,
    /// Unit cell, with lattice vectors as rows
    pub cell: Matrix3,
    /// Cartesian positions of all atoms
    pub positions: Vec<Vector3D>,
    /// Energy without entropy (`e_wo_entrp`)
    pub energy: f64,
    /// Forces acting on all atoms
    pub forces: Vec<Vector3D>,
}

impl TrainingRecord {
    /// Create an [`AtomicSystem`] from this record, using `elements` to
    /// convert element symbols to species.
    pub fn to_system(&self, elements: &ElementTable) -> Result<AtomicSystem, Error> {
        let mut system = AtomicSystem::new(UnitCell::try_from(self.cell)?);
        for (symbol, &position) in self.symbols.iter().zip(&self.positions) {
            system.add_atom(elements.species(symbol)?, position);
        }
        return Ok(system);
    }
}

/// Read all converged ionic steps from the `vasprun.xml` file at `path`.
///
/// See [`parse_vasprun`] for more information.
pub fn read_vasprun(path: impl AsRef<Path>) -> Result<Vec<TrainingRecord>, Error> {
    let file = File::open(path.as_ref())?;
    return parse_vasprun(BufReader::new(file));
}

/// Parse `vasprun.xml` data from `reader`.
///
/// Every `<calculation>` (ionic step) whose number of electronic
/// self-consistency steps is strictly smaller than `NELM` is returned, the
/// others did not converge and are skipped. Fractional positions are
/// converted to Cartesian coordinates using the cell of the same step.
#[time_graph::instrument(name = "parse_vasprun")]
pub fn parse_vasprun<R: BufRead>(reader: R) -> Result<Vec<TrainingRecord>, Error> {
    let mut reader = Reader::from_reader(reader);
    reader.trim_text(true);

    let mut parser = VasprunParser::default();
    let mut buffer = Vec::new();
    loop {
        match reader.read_event_into(&mut buffer)? {
            Event::Start(ref start) => parser.start(start)?,
            Event::Empty(ref start) => {
                parser.start(start)?;
                parser.end()?;
            }
            Event::Text(ref text) => parser.text.push_str(&text.unescape()?),
            Event::End(_) => parser.end()?,
            Event::Eof => break,
            _ => {}
        }
        buffer.clear();
    }

    return parser.finish();
}

/// An element currently open in the document
#[derive(Debug)]
struct Element {
    tag: String,
    /// value of the `name` attribute
    name: Option<String>,
}

impl Element {
    fn is(&self, tag: &str, name: &str) -> bool {
        self.tag == tag && self.name.as_deref() == Some(name)
    }
}

/// Data from a single `<calculation>` element
#[derive(Debug, Default)]
struct Calculation {
    n_scstep: usize,
    basis: Vec<Vector3D>,
    positions: Vec<Vector3D>,
    forces: Vec<Vector3D>,
    energy: Option<f64>,
}

#[derive(Debug, Default)]
struct VasprunParser {
    stack: Vec<Element>,
    text: String,
    nelm_incar: Option<usize>,
    nelm_parameters: Option<usize>,
    symbols: Vec<String>,
    /// number of `<c>` seen in the current `<rc>`
    columns: usize,
    current: Option<Calculation>,
    calculations: Vec<Calculation>,
}

impl VasprunParser {
    fn start(&mut self, start: &BytesStart) -> Result<(), Error> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let name = match start.try_get_attribute("name")? {
            Some(attribute) => Some(attribute.unescape_value()?.trim().to_owned()),
            None => None,
        };

        match tag.as_str() {
            "calculation" => self.current = Some(Calculation::default()),
            "scstep" => {
                if self.parent_is("calculation") {
                    if let Some(current) = &mut self.current {
                        current.n_scstep += 1;
                    }
                }
            }
            "rc" => self.columns = 0,
            _ => {}
        }

        self.text.clear();
        self.stack.push(Element { tag: tag, name: name });
        return Ok(());
    }

    fn end(&mut self) -> Result<(), Error> {
        let text = std::mem::take(&mut self.text);
        let tag = self.stack.last().map(|e| e.tag.clone());

        match tag.as_deref() {
            Some("i") => self.read_i(&text)?,
            Some("c") => self.read_c(&text),
            Some("v") => self.read_v(&text)?,
            Some("calculation") => {
                if let Some(calculation) = self.current.take() {
                    self.calculations.push(calculation);
                }
            }
            _ => {}
        }

        self.stack.pop();
        return Ok(());
    }

    /// Is the parent of the current element a `tag` element?
    fn parent_is(&self, tag: &str) -> bool {
        self.stack.last().map_or(false, |e| e.tag == tag)
    }

    /// Get the element `depth` levels above the current one
    fn ancestor(&self, depth: usize) -> Option<&Element> {
        self.stack.len().checked_sub(depth + 1).map(|i| &self.stack[i])
    }

    fn inside(&self, tag: &str) -> bool {
        self.stack.iter().any(|e| e.tag == tag)
    }

    fn read_i(&mut self, text: &str) -> Result<(), Error> {
        let current = match self.stack.last() {
            Some(element) => element,
            None => return Ok(()),
        };

        if current.name.as_deref() == Some("NELM") {
            let nelm = text.trim().parse::<usize>().map_err(|e| Error::Xml(format!(
                "invalid NELM value '{}': {}", text.trim(), e
            )))?;

            if self.inside("incar") {
                self.nelm_incar = Some(nelm);
            } else if self.inside("parameters") {
                self.nelm_parameters = Some(nelm);
            }
        } else if current.name.as_deref() == Some("e_wo_entrp") {
            // only the energy of the ionic step itself, not the energies of
            // the electronic steps in `scstep`
            let is_step_energy = self.ancestor(1).map_or(false, |e| e.tag == "energy")
                && self.ancestor(2).map_or(false, |e| e.tag == "calculation");

            if is_step_energy {
                let energy = parse_float(text)?;
                if let Some(current) = &mut self.current {
                    current.energy = Some(energy);
                }
            }
        }

        return Ok(());
    }

    fn read_c(&mut self, text: &str) {
        let in_atoms = self.ancestor(3).map_or(false, |e| e.is("array", "atoms"))
            && self.ancestor(4).map_or(false, |e| e.tag == "atominfo");

        if in_atoms && self.ancestor(1).map_or(false, |e| e.tag == "rc") {
            if self.columns == 0 {
                self.symbols.push(text.trim().to_owned());
            }
            self.columns += 1;
        }
    }

    fn read_v(&mut self, text: &str) -> Result<(), Error> {
        if self.current.is_none() {
            return Ok(());
        }

        let is = |depth: usize, tag: &str, name: Option<&str>| {
            self.ancestor(depth).map_or(false, |e| {
                e.tag == tag && (name.is_none() || e.name.as_deref() == name)
            })
        };

        let in_step_structure = |depth: usize| is(depth, "structure", None) && is(depth + 1, "calculation", None);

        let is_basis = is(1, "varray", Some("basis")) && is(2, "crystal", None) && in_step_structure(3);
        let is_positions = is(1, "varray", Some("positions")) && in_step_structure(2);
        let is_forces = is(1, "varray", Some("forces")) && is(2, "calculation", None);

        if !(is_basis || is_positions || is_forces) {
            return Ok(());
        }

        let vector = parse_vector(text)?;
        if let Some(current) = &mut self.current {
            if is_basis {
                current.basis.push(vector);
            } else if is_positions {
                current.positions.push(vector);
            } else {
                current.forces.push(vector);
            }
        }

        return Ok(());
    }

    fn finish(self) -> Result<Vec<TrainingRecord>, Error> {
        let nelm = self.nelm_incar.or(self.nelm_parameters).ok_or_else(|| Error::Xml(
            "could not find NELM in this vasprun.xml file".into()
        ))?;

        let n_calculations = self.calculations.len();
        let mut records = Vec::new();
        for (step, calculation) in self.calculations.into_iter().enumerate() {
            if calculation.n_scstep >= nelm {
                info!(
                    "skipping ionic step {}, electronic steps did not converge ({} steps for NELM={})",
                    step, calculation.n_scstep, nelm
                );
                continue;
            }

            records.push(to_record(step, calculation, &self.symbols)?);
        }

        debug!("read {} converged ionic steps out of {}", records.len(), n_calculations);
        return Ok(records);
    }
}

fn to_record(step: usize, calculation: Calculation, symbols: &[String]) -> Result<TrainingRecord, Error> {
    if calculation.basis.len() != 3 {
        return Err(Error::Xml(format!(
            "expected 3 basis vectors in ionic step {}, got {}", step, calculation.basis.len()
        )));
    }

    let n_atoms = symbols.len();
    if calculation.positions.len() != n_atoms || calculation.forces.len() != n_atoms {
        return Err(Error::Xml(format!(
            "ionic step {} contains {} positions and {} forces for {} atoms",
            step, calculation.positions.len(), calculation.forces.len(), n_atoms
        )));
    }

    let energy = calculation.energy.ok_or_else(|| Error::Xml(format!(
        "missing e_wo_entrp energy in ionic step {}", step
    )))?;

    let cell = Matrix3::new([
        calculation.basis[0].into(),
        calculation.basis[1].into(),
        calculation.basis[2].into(),
    ]);

    // fractional to cartesian, `fractional @ cell`
    let transpose = cell.transposed();
    let positions = calculation.positions.iter().map(|&f| transpose * f).collect();

    return Ok(TrainingRecord {
        symbols: symbols.to_vec(),
        cell: cell,
        positions: positions,
        energy: energy,
        forces: calculation.forces,
    });
}

fn parse_float(text: &str) -> Result<f64, Error> {
    text.trim().parse::<f64>().map_err(|e| Error::Xml(format!(
        "invalid floating point value '{}': {}", text.trim(), e
    )))
}

fn parse_vector(text: &str) -> Result<Vector3D, Error> {
    let values = text.split_whitespace().map(parse_float).collect::<Result<Vec<_>, _>>()?;
    if values.len() != 3 {
        return Err(Error::Xml(format!(
            "expected 3 values in vector, got '{}'", text.trim()
        )));
    }
    return Ok(Vector3D::new(values[0], values[1], values[2]));
}
