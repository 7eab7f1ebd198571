//! CSV output of evaluation results.
use crate::{ContextSizeResult, EvalSummary};
use anyhow::Result;
use csv::{Writer, WriterBuilder};
use icrl_core::record::{Record, RecordValue, Recorder};
use log::info;
use serde::Serialize;
use std::{
    convert::TryFrom,
    fs::{create_dir_all, File},
    path::{Path, PathBuf},
};

#[derive(Debug, Serialize)]
struct EpisodeRecord {
    model_context_len: usize,
    repeat: usize,
    episode: usize,
    context_len: usize,
    return_mean: f32,
}

impl TryFrom<&Record> for EpisodeRecord {
    type Error = anyhow::Error;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(Self {
            model_context_len: record.get_scalar("model_context_len")? as _,
            repeat: record.get_scalar("repeat")? as _,
            episode: record.get_scalar("episode")? as _,
            context_len: record.get_scalar("context_len")? as _,
            return_mean: record.get_scalar("return_mean")?,
        })
    }
}

#[derive(Debug, Serialize)]
struct CurveRecord {
    context_len: usize,
    episode: usize,
    mean: f32,
    sem: f32,
}

#[derive(Debug, Serialize)]
struct BarRecord {
    context_len: usize,
    opt: f32,
    learner: f32,
    learner_greedy: f32,
}

#[derive(Debug, Serialize)]
struct GraphRecord {
    model_context_len: usize,
    context_len: usize,
    opt: f32,
    opt_sem: f32,
    learner: f32,
    learner_sem: f32,
    learner_greedy: f32,
    learner_greedy_sem: f32,
}

fn writer(path: &Path) -> Result<Writer<File>> {
    if let Some(dir) = path.parent() {
        create_dir_all(dir)?;
    }
    Ok(WriterBuilder::new().from_writer(File::create(path)?))
}

/// Writes the per-episode records of online evaluation as CSV rows.
///
/// Records must carry `model_context_len` and `repeat` in addition to the keys
/// written by the online evaluator, see [`TaggedRecorder`].
pub struct CsvRecorder {
    wtr: Writer<File>,
}

impl CsvRecorder {
    /// Creates the file and its parent directories.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            wtr: writer(path.as_ref())?,
        })
    }
}

impl Recorder for CsvRecorder {
    fn write(&mut self, record: Record) -> Result<()> {
        self.wtr.serialize(EpisodeRecord::try_from(&record)?)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.wtr.flush()?;
        Ok(())
    }
}

/// Adds the model context size and repeat index to records before forwarding them.
pub struct TaggedRecorder<'a> {
    inner: &'a mut dyn Recorder,
    model_context_len: usize,
    repeat: usize,
}

impl<'a> TaggedRecorder<'a> {
    /// Constructs [`TaggedRecorder`].
    pub fn new(inner: &'a mut dyn Recorder, model_context_len: usize, repeat: usize) -> Self {
        Self {
            inner,
            model_context_len,
            repeat,
        }
    }
}

impl<'a> Recorder for TaggedRecorder<'a> {
    fn write(&mut self, record: Record) -> Result<()> {
        let tags = Record::from_slice(&[
            (
                "model_context_len",
                RecordValue::Scalar(self.model_context_len as f32),
            ),
            ("repeat", RecordValue::Scalar(self.repeat as f32)),
        ]);
        self.inner.write(record.merge(tags))
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

/// Path of the file of per-episode records.
pub fn episodes_path(evals_dir: &Path, save_filename: &str) -> PathBuf {
    evals_dir
        .join("online")
        .join(format!("{}_episodes.csv", save_filename))
}

/// Writes the online return curves, one row per context size and episode.
pub fn write_curves(evals_dir: &Path, summary: &EvalSummary) -> Result<PathBuf> {
    let path = evals_dir
        .join("online")
        .join(format!("{}.csv", summary.save_filename));
    let mut wtr = writer(&path)?;
    for result in summary.results.iter() {
        let curve = &result.curve;
        for (episode, (mean, sem)) in curve.mean.iter().zip(curve.sem.iter()).enumerate() {
            wtr.serialize(CurveRecord {
                context_len: result.context_len,
                episode,
                mean: *mean,
                sem: *sem,
            })?;
        }
    }
    wtr.flush()?;
    info!("Wrote online returns to {:?}", path);
    Ok(path)
}

/// Writes the mean offline returns, one row per context size.
///
/// Returns `None` if no context size was evaluated offline.
pub fn write_bars(evals_dir: &Path, summary: &EvalSummary) -> Result<Option<PathBuf>> {
    let rows = summary
        .results
        .iter()
        .filter_map(|r: &ContextSizeResult| r.offline.as_ref().map(|o| (r.context_len, o.means())))
        .collect::<Vec<_>>();
    if rows.is_empty() {
        return Ok(None);
    }

    let path = evals_dir
        .join("bar")
        .join(format!("{}_bar.csv", summary.save_filename));
    let mut wtr = writer(&path)?;
    for (context_len, [opt, learner, learner_greedy]) in rows {
        wtr.serialize(BarRecord {
            context_len,
            opt,
            learner,
            learner_greedy,
        })?;
    }
    wtr.flush()?;
    info!("Wrote offline returns to {:?}", path);
    Ok(Some(path))
}

/// Writes the offline returns per length of the recorded context, one row per
/// context size of the model and prefix length.
///
/// Returns `None` if no context size was evaluated this way.
pub fn write_graph(evals_dir: &Path, summary: &EvalSummary) -> Result<Option<PathBuf>> {
    let graphs = summary
        .results
        .iter()
        .filter_map(|r| r.graph.as_ref().map(|g| (r.context_len, g)))
        .collect::<Vec<_>>();
    if graphs.is_empty() {
        return Ok(None);
    }

    let path = evals_dir
        .join("graph")
        .join(format!("{}_graph.csv", summary.save_filename));
    let mut wtr = writer(&path)?;
    for (model_context_len, graph) in graphs {
        for (context_len, returns) in graph.iter() {
            let [opt, learner, learner_greedy] = returns.means();
            let [opt_sem, learner_sem, learner_greedy_sem] = returns.sems();
            wtr.serialize(GraphRecord {
                model_context_len,
                context_len,
                opt,
                opt_sem,
                learner,
                learner_sem,
                learner_greedy,
                learner_greedy_sem,
            })?;
        }
    }
    wtr.flush()?;
    info!("Wrote offline returns per context length to {:?}", path);
    Ok(Some(path))
}
