use crate::{
    db::query::{Bound, Page, QueryError},
    model::index::{IndexModel, IndexValue},
    obs::PlanKind,
};

///
/// ResolvedScan
/// The single scan primitive a bound list dispatches to.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResolvedScan {
    Full,
    By(&'static IndexModel),
    Where(IndexValue),
    Range {
        index: &'static IndexModel,
        from: Option<Vec<u8>>,
        to: Option<Vec<u8>>,
    },
}

impl ResolvedScan {
    #[must_use]
    pub const fn kind(&self) -> PlanKind {
        match self {
            Self::Full => PlanKind::FullScan,
            Self::By(_) => PlanKind::By,
            Self::Where(_) => PlanKind::Where,
            Self::Range { .. } => PlanKind::Range,
        }
    }

    // Render a stable summary for debug logging.
    pub(crate) fn debug_summary(&self) -> String {
        let side = |v: &Option<Vec<u8>>| {
            v.as_deref()
                .map_or_else(|| "..".to_string(), |v| String::from_utf8_lossy(v).into_owned())
        };

        match self {
            Self::Full => "full scan".to_string(),
            Self::By(index) => format!("index scan ({index})"),
            Self::Where(value) => format!("member scan ({value})"),
            Self::Range { index, from, to } => {
                format!("range scan ({index} [{}, {}])", side(from), side(to))
            }
        }
    }
}

///
/// ResolvedQuery
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedQuery {
    pub scan: ResolvedScan,
    pub page: Option<Page>,
}

///
/// ScanBound
/// A bound that selects rows. Pages never reach the scan resolver.
///

#[derive(Clone, Copy, Debug)]
enum ScanBound<'a> {
    Where(&'a IndexValue),
    By(&'static IndexModel),
    From(&'a IndexValue),
    To(&'a IndexValue),
    Range {
        index: &'static IndexModel,
        from: Option<&'a [u8]>,
        to: Option<&'a [u8]>,
    },
}

impl ScanBound<'_> {
    const fn kind(self) -> &'static str {
        match self {
            Self::Where(_) => "where",
            Self::By(_) => "by",
            Self::From(_) => "from",
            Self::To(_) => "to",
            Self::Range { .. } => "range",
        }
    }
}

/// Validate a bound list and pick the scan it describes.
///
/// Page bounds are pulled out first; the remaining zero, one, or two bounds
/// select exactly one scan primitive.
pub fn resolve(bounds: &[Bound]) -> Result<ResolvedQuery, QueryError> {
    let mut page = None;
    let mut pages = 0;
    let mut scan_bounds = Vec::with_capacity(2);

    for bound in bounds {
        let scan_bound = match bound {
            Bound::Page(p) => {
                pages += 1;
                page = Some(*p);
                continue;
            }
            Bound::Where(value) => ScanBound::Where(value),
            Bound::By(index) => ScanBound::By(*index),
            Bound::From(value) => ScanBound::From(value),
            Bound::To(value) => ScanBound::To(value),
            Bound::Range { index, from, to } => ScanBound::Range {
                index: *index,
                from: from.as_deref(),
                to: to.as_deref(),
            },
        };
        scan_bounds.push(scan_bound);
    }
    if pages > 1 {
        return Err(QueryError::MultiplePages(pages));
    }

    let scan = match scan_bounds.as_slice() {
        [] => ResolvedScan::Full,
        [single] => resolve_single(*single)?,
        [a, b] => resolve_pair(*a, *b)?,
        more => return Err(QueryError::TooManyBounds(more.len())),
    };

    Ok(ResolvedQuery { scan, page })
}

fn resolve_single(bound: ScanBound<'_>) -> Result<ResolvedScan, QueryError> {
    let scan = match bound {
        ScanBound::Where(value) => {
            non_empty("where", value)?;
            ResolvedScan::Where(value.clone())
        }
        ScanBound::By(index) => ResolvedScan::By(index),
        ScanBound::From(value) => {
            non_empty("from", value)?;
            ResolvedScan::Range {
                index: value.index(),
                from: Some(value.value().to_vec()),
                to: None,
            }
        }
        ScanBound::To(value) => {
            non_empty("to", value)?;
            ResolvedScan::Range {
                index: value.index(),
                from: None,
                to: Some(value.value().to_vec()),
            }
        }
        ScanBound::Range {
            index,
            from: None,
            to: None,
        } => ResolvedScan::By(index),
        ScanBound::Range { index, from, to } => {
            if [from, to].into_iter().flatten().any(<[u8]>::is_empty) {
                return Err(QueryError::EmptyValue {
                    kind: "range",
                    index: index.name(),
                });
            }
            ResolvedScan::Range {
                index,
                from: from.map(<[u8]>::to_vec),
                to: to.map(<[u8]>::to_vec),
            }
        }
    };

    Ok(scan)
}

fn resolve_pair(a: ScanBound<'_>, b: ScanBound<'_>) -> Result<ResolvedScan, QueryError> {
    let (from, to) = match (a, b) {
        (ScanBound::From(from), ScanBound::To(to)) | (ScanBound::To(to), ScanBound::From(from)) => {
            (from, to)
        }
        _ => return Err(QueryError::UnsupportedPair(a.kind(), b.kind())),
    };

    non_empty("from", from)?;
    non_empty("to", to)?;
    if !from.same_index(to) {
        return Err(QueryError::IndexMismatch {
            from: from.index().name(),
            to: to.index().name(),
        });
    }

    Ok(ResolvedScan::Range {
        index: from.index(),
        from: Some(from.value().to_vec()),
        to: Some(to.value().to_vec()),
    })
}

fn non_empty(kind: &'static str, value: &IndexValue) -> Result<(), QueryError> {
    if value.is_empty() {
        return Err(QueryError::EmptyValue {
            kind,
            index: value.index().name(),
        });
    }

    Ok(())
}
