//! Column rename/delete rewriting of everything that names a column

use super::error::StateResult;
use crate::data::DataError;
use crate::project::ProjectState;

/// Rename `old` to `new` across the dataset, the chart and the pipeline.
///
/// `produced` lists the columns of the current pipeline output. The new name
/// must be free in the dataset, in `produced` and among the transform result
/// columns, otherwise a transform would overwrite the renamed column.
/// Nothing is rewritten unless all of them accept it.
pub(crate) fn rename_column<'a>(
    project: &ProjectState,
    produced: impl IntoIterator<Item = &'a str>,
    old: &str,
    new: &str,
) -> StateResult<ProjectState> {
    let dataset = project.dataset.rename_column(old, new)?;
    let new = new.trim();
    let taken = produced.into_iter().any(|name| name == new)
        || project
            .transforms
            .iter()
            .any(|t| t.kind.output_column() == Some(new));
    if taken {
        return Err(DataError::duplicate_name(new).into());
    }

    let mut next = project.with_dataset(dataset);
    for series in &mut next.chart.series {
        if series.source_column == old {
            series.source_column = new.to_string();
        }
    }
    if next.chart.x_column.as_deref() == Some(old) {
        next.chart.x_column = Some(new.to_string());
    }
    for transform in &mut next.transforms {
        transform.kind.rename_column(old, new);
    }
    Ok(next)
}

/// Delete `name` from the dataset and drop every series that plotted it
pub(crate) fn delete_column(project: &ProjectState, name: &str) -> StateResult<ProjectState> {
    let dataset = project.dataset.delete_column(name)?;

    let mut next = project.with_dataset(dataset);
    next.chart.series.retain(|s| s.source_column != name);
    if next.chart.x_column.as_deref() == Some(name) {
        next.chart.x_column = None;
    }
    Ok(next)
}
