use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::api::config_dto::UnrollerDto;
use crate::api::pgt_dto::parse_pgt;
use crate::domain::graph::physical_graph::PhysicalGraph;
use crate::domain::graph::template::LogicalGraphTemplate;
use crate::error::{Error, Result};
use crate::loader::parser::resolve_path;

/// Turns a logical graph template into its physical graph for a given parallelism.
pub trait GraphExpander {
    fn expand(&self, template: &LogicalGraphTemplate, parallelism: u32) -> Result<PhysicalGraph>;
}

fn tool_error(template: &LogicalGraphTemplate, parallelism: u32, reason: impl Into<String>) -> Error {
    Error::ExternalToolError { template: template.path.display().to_string(), parallelism, reason: reason.into() }
}

fn physical_graph_from_output(output: &str, template: &LogicalGraphTemplate, parallelism: u32) -> Result<PhysicalGraph> {
    parse_pgt(output)
        .and_then(|elements| PhysicalGraph::from_elements(&elements))
        .map_err(|e| tool_error(template, parallelism, e.to_string()))
}

/// Builds the expander selected in the generator configuration.
pub fn expander_from_dto(dto: &UnrollerDto, base_dir: &Path) -> Box<dyn GraphExpander> {
    match dto {
        UnrollerDto::Dlg { command, timeout_secs } => Box::new(DlgUnroller::new(command.clone(), Duration::from_secs(*timeout_secs))),
        UnrollerDto::Precomputed { directory } => Box::new(PrecomputedExpander::new(resolve_path(base_dir, directory))),
    }
}

/// Runs `<command> unroll -L /dev/stdin` with the parallelism-adjusted template on stdin.
///
/// `command` may carry leading arguments (e.g. `python -m dlg`).
#[derive(Debug, Clone)]
pub struct DlgUnroller {
    command: String,
    timeout: Duration,
}

impl DlgUnroller {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        DlgUnroller { command: command.into(), timeout }
    }

    fn run(&self, input: String) -> std::result::Result<String, String> {
        let mut words = self.command.split_whitespace();
        let program = words.next().ok_or_else(|| "empty unroller command".to_string())?;
        let prefix: Vec<&str> = words.collect();

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|e| format!("could not start runtime: {}", e))?;

        runtime.block_on(async {
            let mut child = Command::new(program)
                .args(&prefix)
                .args(["unroll", "-L", "/dev/stdin"])
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| format!("could not start '{}': {}", program, e))?;

            if let Some(mut stdin) = child.stdin.take() {
                tokio::spawn(async move {
                    if let Err(e) = stdin.write_all(input.as_bytes()).await {
                        log::debug!("Unroller closed stdin early: {}", e);
                    }
                });
            }

            let output = tokio::time::timeout(self.timeout, child.wait_with_output())
                .await
                .map_err(|_| format!("timed out after {:?}", self.timeout))?
                .map_err(|e| e.to_string())?;

            if !output.status.success() {
                return Err(format!("exited with {}: {}", output.status, String::from_utf8_lossy(&output.stderr).trim()));
            }
            String::from_utf8(output.stdout).map_err(|e| format!("output is not UTF-8: {}", e))
        })
    }
}

impl GraphExpander for DlgUnroller {
    fn expand(&self, template: &LogicalGraphTemplate, parallelism: u32) -> Result<PhysicalGraph> {
        log::info!("Unrolling '{}' with parallelism {}", template.path.display(), parallelism);

        let input = serde_json::to_string(&template.with_parallelism(parallelism)?)?;
        let output = self.run(input).map_err(|reason| tool_error(template, parallelism, reason))?;
        physical_graph_from_output(&output, template, parallelism)
    }
}

/// Reads graphs unrolled ahead of time: `<stem>_<parallelism>.json`, falling back to `<stem>.json`.
#[derive(Debug, Clone)]
pub struct PrecomputedExpander {
    directory: PathBuf,
}

impl PrecomputedExpander {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        PrecomputedExpander { directory: directory.into() }
    }
}

impl GraphExpander for PrecomputedExpander {
    fn expand(&self, template: &LogicalGraphTemplate, parallelism: u32) -> Result<PhysicalGraph> {
        let stem = template.stem();
        let candidates = [self.directory.join(format!("{}_{}.json", stem, parallelism)), self.directory.join(format!("{}.json", stem))];

        let path = candidates
            .iter()
            .find(|p| p.is_file())
            .ok_or_else(|| tool_error(template, parallelism, format!("no pre-unrolled graph for '{}' in {}", stem, self.directory.display())))?;

        log::debug!("Using pre-unrolled graph {}", path.display());
        let output = std::fs::read_to_string(path).map_err(|e| tool_error(template, parallelism, e.to_string()))?;
        physical_graph_from_output(&output, template, parallelism)
    }
}

/// Expands each (template, parallelism) once and shares the structure afterwards.
pub struct CachingExpander {
    inner: Box<dyn GraphExpander>,
    cache: RwLock<HashMap<(PathBuf, u32), Arc<PhysicalGraph>>>,
}

impl CachingExpander {
    pub fn new(inner: Box<dyn GraphExpander>) -> Self {
        CachingExpander { inner, cache: RwLock::new(HashMap::new()) }
    }

    pub fn get(&self, template: &LogicalGraphTemplate, parallelism: u32) -> Result<Arc<PhysicalGraph>> {
        let key = (template.path.clone(), parallelism);
        if let Some(graph) = self.cache.read().ok().and_then(|cache| cache.get(&key).cloned()) {
            return Ok(graph);
        }

        let graph = Arc::new(self.inner.expand(template, parallelism)?);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, Arc::clone(&graph));
        }
        Ok(graph)
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.read().map(|cache| cache.len()).unwrap_or(0)
    }
}

impl GraphExpander for CachingExpander {
    fn expand(&self, template: &LogicalGraphTemplate, parallelism: u32) -> Result<PhysicalGraph> {
        Ok(self.get(template, parallelism)?.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PGT: &str = r#"[{"oid": "a", "nm": "Grid", "app": "x"}, {"oid": "b", "nm": "Gather", "app": "x"}, {"oid": "d", "storage": "M", "producers": ["a"], "consumers": ["b"]}]"#;

    fn template(name: &str) -> LogicalGraphTemplate {
        LogicalGraphTemplate::from_value(name, json!({"nodeDataArray": []}))
    }

    struct CountingExpander {
        calls: Arc<AtomicUsize>,
    }

    impl GraphExpander for CountingExpander {
        fn expand(&self, template: &LogicalGraphTemplate, parallelism: u32) -> Result<PhysicalGraph> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            physical_graph_from_output(PGT, template, parallelism)
        }
    }

    /// Unroller stand-in: a shell script run through `sh`, ignoring the `unroll` arguments.
    fn fake_dlg(dir: &Path, body: &str) -> DlgUnroller {
        let script = dir.join("fake_dlg.sh");
        fs::write(&script, body).unwrap();
        DlgUnroller::new(format!("sh {}", script.display()), Duration::from_millis(2000))
    }

    #[test]
    fn test_precomputed_prefers_parallelism_specific_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("scatter.json"), r#"[{"oid": "a", "nm": "Only", "app": "x"}]"#).unwrap();
        fs::write(dir.path().join("scatter_4.json"), PGT).unwrap();
        let expander = PrecomputedExpander::new(dir.path());

        let four = expander.expand(&template("graphs/scatter.graph"), 4).unwrap();
        let two = expander.expand(&template("graphs/scatter.graph"), 2).unwrap();

        assert_eq!(four.tasks().len(), 2);
        assert_eq!(two.tasks().len(), 1);
    }

    #[test]
    fn test_precomputed_missing_graph_is_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = PrecomputedExpander::new(dir.path()).expand(&template("graphs/pulsar.graph"), 1);

        match result {
            Err(Error::ExternalToolError { template, parallelism, .. }) => {
                assert_eq!(template, "graphs/pulsar.graph");
                assert_eq!(parallelism, 1);
            }
            other => panic!("expected tool error, got {:?}", other),
        }
    }

    #[test]
    fn test_unparsable_output_is_tool_error() {
        assert!(matches!(physical_graph_from_output("not json", &template("t"), 2), Err(Error::ExternalToolError { .. })));
    }

    #[test]
    fn test_cache_expands_once_per_key() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CachingExpander::new(Box::new(CountingExpander { calls: Arc::clone(&calls) }));

        let first = cache.get(&template("a.graph"), 4).unwrap();
        let second = cache.get(&template("a.graph"), 4).unwrap();
        cache.expand(&template("a.graph"), 8).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.cached_entries(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_unroller_output_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let unroller = fake_dlg(dir.path(), &format!("cat > /dev/null\necho '{}'\n", PGT));

        let graph = unroller.expand(&template("graphs/scatter.graph"), 4).unwrap();

        assert_eq!(graph.tasks().len(), 2);
        assert_eq!(graph.data_products().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_unroller_failure_and_timeout_are_tool_errors() {
        let dir = tempfile::tempdir().unwrap();

        let failing = fake_dlg(dir.path(), "echo 'translation failed' >&2\nexit 3\n");
        assert!(matches!(failing.expand(&template("t.graph"), 2), Err(Error::ExternalToolError { .. })));

        let slow = DlgUnroller { timeout: Duration::from_millis(200), ..fake_dlg(dir.path(), "sleep 5\n") };
        assert!(matches!(slow.expand(&template("t.graph"), 2), Err(Error::ExternalToolError { .. })));

        let missing = DlgUnroller::new("definitely-not-a-dlg-binary", Duration::from_secs(1));
        assert!(matches!(missing.expand(&template("t.graph"), 2), Err(Error::ExternalToolError { .. })));
    }
}
