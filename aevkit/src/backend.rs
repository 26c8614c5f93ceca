/// Numeric backend used to run a computation.
///
/// The backend is selected once per call and passed down to every stage of
/// the pipeline. Both backends produce bit-identical results: the parallel
/// backend only changes how independent work is distributed, all reductions
/// keep the serial summation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Plain loops on the calling thread
    #[default]
    Serial,
    /// Data-parallel loops running on the rayon global thread pool
    Parallel,
}

impl Backend {
    /// Should this backend use rayon?
    pub fn is_parallel(self) -> bool {
        self == Backend::Parallel
    }
}
