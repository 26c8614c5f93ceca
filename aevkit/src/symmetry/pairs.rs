use ndarray::Array2;

use crate::Error;

/// Symmetric table mapping unordered pairs of species `(a, b)` to a dense
/// index in `0..E (E + 1) / 2`.
///
/// Pairs are enumerated in row-major order of the upper triangle: `(0, 0)`,
/// `(0, 1)`, ..., `(0, E - 1)`, `(1, 1)`, `(1, 2)`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPairs {
    table: Array2<usize>,
}

impl ElementPairs {
    /// Create the pair table for `num_elements` species
    pub fn new(num_elements: usize) -> Result<ElementPairs, Error> {
        let mut table = Array2::zeros((num_elements, num_elements));
        let mut index = 0;
        for a in 0..num_elements {
            for b in a..num_elements {
                table[[a, b]] = index;
                table[[b, a]] = index;
                index += 1;
            }
        }

        return ElementPairs::from_table(table);
    }

    /// Use an existing pair `table`, checking that it is symmetric, and that
    /// every index in `0..E (E + 1) / 2` corresponds to exactly one unordered
    /// pair of species.
    pub fn from_table(table: Array2<usize>) -> Result<ElementPairs, Error> {
        let num_elements = table.nrows();
        if table.ncols() != num_elements {
            return Err(Error::InvalidParameter(format!(
                "element pair table must be square, got shape {:?}", table.shape()
            )));
        }

        let n_pairs = num_elements * (num_elements + 1) / 2;
        let mut seen = vec![false; n_pairs];
        for a in 0..num_elements {
            for b in a..num_elements {
                let index = table[[a, b]];
                if table[[b, a]] != index {
                    return Err(Error::InvalidParameter(format!(
                        "element pair table is not symmetric for species {} and {}", a, b
                    )));
                }

                if index >= n_pairs || seen[index] {
                    return Err(Error::InvalidParameter(format!(
                        "element pair table must contain each index in 0..{} exactly once, \
                        got {} for species {} and {}", n_pairs, index, a, b
                    )));
                }
                seen[index] = true;
            }
        }

        return Ok(ElementPairs { table: table });
    }

    /// Number of species
    pub fn num_elements(&self) -> usize {
        self.table.nrows()
    }

    /// Number of unordered pairs of species
    pub fn len(&self) -> usize {
        let n = self.num_elements();
        n * (n + 1) / 2
    }

    /// Is this table empty?
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Get the index of the pair `(a, b)`, which is the same as `(b, a)`
    #[inline]
    pub fn index(&self, a: usize, b: usize) -> usize {
        self.table[[a, b]]
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr2;

    use super::*;

    #[test]
    fn enumeration() {
        let pairs = ElementPairs::new(3).unwrap();
        assert_eq!(pairs.len(), 6);
        assert_eq!(pairs.table, arr2(&[
            [0, 1, 2],
            [1, 3, 4],
            [2, 4, 5],
        ]));

        for a in 0..3 {
            for b in 0..3 {
                assert_eq!(pairs.index(a, b), pairs.index(b, a));
            }
        }

        assert_eq!(ElementPairs::new(1).unwrap().len(), 1);
        assert_eq!(ElementPairs::new(4).unwrap().index(3, 3), 9);
    }

    #[test]
    fn invalid_tables() {
        let error = ElementPairs::from_table(arr2(&[[0, 1], [2, 2]])).unwrap_err();
        assert!(error.to_string().contains("not symmetric"));

        let error = ElementPairs::from_table(arr2(&[[0, 0], [0, 1]])).unwrap_err();
        assert!(error.to_string().contains("exactly once"));

        let error = ElementPairs::from_table(arr2(&[[0, 1], [1, 3]])).unwrap_err();
        assert!(error.to_string().contains("got 3 for species 1 and 1"));

        // any other permutation of the indexes is fine
        let pairs = ElementPairs::from_table(arr2(&[[2, 0], [0, 1]])).unwrap();
        assert_eq!(pairs.index(0, 0), 2);
    }
}
