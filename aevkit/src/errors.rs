#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Got an invalid parameter value in a function, or inconsistent input
    /// data (mismatched lengths, out of range species or affiliation, ...)
    InvalidParameter(String),
    /// Error while serializing/deserializing data
    Json(serde_json::Error),
    /// Error when reshaping or assembling arrays
    Shape(ndarray::ShapeError),
    /// Error while reading files
    Io(std::io::Error),
    /// Error while parsing XML data, or missing data in a XML file
    Xml(String),
    /// Error related to reading structure files with chemfiles
    Chemfiles(String),
    /// Internal invariant violation, this is a bug
    Internal(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameter(e) => write!(f, "invalid parameter: {}", e),
            Error::Json(e) => write!(f, "json error: {}", e),
            Error::Shape(e) => write!(f, "array shape error: {}", e),
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Xml(e) => write!(f, "xml error: {}", e),
            Error::Chemfiles(e) => write!(f, "chemfiles error: {}", e),
            Error::Internal(e) => write!(f, "internal error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidParameter(_) |
            Error::Xml(_) |
            Error::Chemfiles(_) |
            Error::Internal(_) => None,
            Error::Json(e) => Some(e),
            Error::Shape(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Json(error)
    }
}

impl From<ndarray::ShapeError> for Error {
    fn from(error: ndarray::ShapeError) -> Error {
        Error::Shape(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Error {
        Error::Io(error)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(error: quick_xml::Error) -> Error {
        Error::Xml(error.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(error: quick_xml::events::attributes::AttrError) -> Error {
        Error::Xml(error.to_string())
    }
}
