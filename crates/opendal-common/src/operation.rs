use std::fmt::{Display, Formatter};

/// Name of an `Accessor` API, used to tag errors, logs and metrics
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default)]
#[non_exhaustive]
pub enum Operation {
    #[default]
    Metadata,
    Create,
    Read,
    Write,
    Stat,
    Delete,
    List,
    BlockingCreate,
    BlockingRead,
    BlockingWrite,
    BlockingStat,
    BlockingDelete,
    BlockingList,
}

impl Operation {
    pub fn into_static(self) -> &'static str {
        self.into()
    }

    pub fn is_blocking(self) -> bool {
        matches!(
            self,
            Operation::BlockingCreate
                | Operation::BlockingRead
                | Operation::BlockingWrite
                | Operation::BlockingStat
                | Operation::BlockingDelete
                | Operation::BlockingList
        )
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_static())
    }
}

impl From<Operation> for &'static str {
    fn from(v: Operation) -> &'static str {
        match v {
            Operation::Metadata => "metadata",
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Stat => "stat",
            Operation::Delete => "delete",
            Operation::List => "list",
            Operation::BlockingCreate => "blocking_create",
            Operation::BlockingRead => "blocking_read",
            Operation::BlockingWrite => "blocking_write",
            Operation::BlockingStat => "blocking_stat",
            Operation::BlockingDelete => "blocking_delete",
            Operation::BlockingList => "blocking_list",
        }
    }
}

impl From<Operation> for String {
    fn from(v: Operation) -> Self {
        v.into_static().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::default(), Operation::Metadata);
        assert_eq!(Operation::BlockingList.to_string(), "blocking_list");
        assert!(Operation::BlockingRead.is_blocking());
        assert!(!Operation::Read.is_blocking());
    }
}
