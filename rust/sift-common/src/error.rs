use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// HTTP-like status code describing who is at fault for the failure.
    pub fn code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotImplemented { .. } => 501,
            _ => 400,
        }
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn not_implemented(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::NotImplemented {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn collection_not_found(collection: impl Into<String>) -> Error {
        Error(
            ErrorKind::CollectionNotFound {
                collection: collection.into(),
            }
            .into(),
        )
    }

    pub fn reference_filter(collection: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::ReferenceFilter {
                collection: collection.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_filter_value(field: impl Into<String>, value: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFilterValue {
                field: field.into(),
                value: value.into(),
            }
            .into(),
        )
    }
}

#[derive(Debug, Clone, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("not yet implemented: {message}")]
    NotImplemented { message: String },

    #[error("Referenced collection `{collection}` not found.")]
    CollectionNotFound { collection: String },

    #[error("Failed to apply reference filter on `{collection}` collection: {message}")]
    ReferenceFilter { collection: String, message: String },

    #[error("invalid value `{value}` for filter on field `{field}`")]
    InvalidFilterValue { field: String, value: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(_: std::convert::Infallible) -> Self {
        Error::invalid_operation("conversion")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_error_messages() {
        let err = Error::collection_not_found("customers");
        assert_eq!(err.to_string(), "Referenced collection `customers` not found.");
        assert_eq!(err.code(), 400);

        let err = Error::reference_filter("customers", "field `age` not found");
        assert_eq!(
            err.to_string(),
            "Failed to apply reference filter on `customers` collection: field `age` not found"
        );
        assert!(matches!(err.kind(), ErrorKind::ReferenceFilter { .. }));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::not_implemented("geo filters").code(), 501);
        assert_eq!(Error::invalid_arg("values", "empty").code(), 400);
        assert_eq!(Error::invalid_filter_value("price", "abc").code(), 400);
    }

    #[test]
    fn test_clone_preserves_kind() {
        let err = Error::invalid_filter_value("price", "abc");
        let copy = err.clone();
        match copy.into_kind() {
            ErrorKind::InvalidFilterValue { field, value } => {
                assert_eq!(field, "price");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
