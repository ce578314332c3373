use core::fmt::{self, Display, Formatter};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleErrorKind {
    CyclicDependency { path: Box<[String]> },
}

impl Display for CycleErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CycleErrorKind::CyclicDependency { path } => {
                write!(f, "Cyclic dependency detected: ")?;
                let mut ids = path.iter();
                if let Some(id) = ids.next() {
                    write!(f, "{id}")?;
                }
                for id in ids {
                    write!(f, " -> {id}")?;
                }
            }
        }
        Ok(())
    }
}
