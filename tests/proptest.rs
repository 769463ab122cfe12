use proptest::prelude::*;
use pysurvey::{aggregate, analyze_file, FileOutcome, PythonParser};
use std::path::Path;

/// Statement fragments that exercise every extraction stage.
const FRAGMENTS: &[&str] = &[
    "import requests\n",
    "import httpx\n",
    "from flask import Flask\napp = Flask(__name__)\n",
    "def helper():\n    return 1\n",
    "def caller():\n    helper()\n    requests.get('/a')\n",
    "@app.route('/x', methods=['GET', 'POST'])\ndef view():\n    return helper()\n",
    "class Store:\n    def save(self, item): ...\n",
    "class Disk:\n    def save(self, item):\n        return self.flush()\n    def flush(self):\n        pass\n",
    "async def fetch():\n    async with httpx.AsyncClient() as c:\n        await c.get(f'/u/{1}')\n",
    "def test_thing():\n    assert True\n",
    "class TestStore:\n    def test_save(self):\n        pass\n",
    "x = (\n",
    "print(len([1, 2]))\n",
];

fn source_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..8).prop_map(|parts| parts.concat())
}

fn outcome(path: &str, src: &str) -> FileOutcome {
    let tree = PythonParser::new().parse(src).unwrap();
    match analyze_file(Path::new(path), &tree) {
        Ok(analysis) => FileOutcome::Analyzed(analysis),
        Err(diagnostic) => FileOutcome::Failed(diagnostic),
    }
}

proptest! {
    #[test]
    fn analysis_is_deterministic(src in source_strategy()) {
        let first = serde_json::to_string(&aggregate(vec![outcome("m.py", &src)])).unwrap();
        let second = serde_json::to_string(&aggregate(vec![outcome("m.py", &src)])).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn aggregation_ignores_completion_order(
        sources in prop::collection::vec(source_strategy(), 1..6),
        seed in any::<u64>(),
    ) {
        let outcomes: Vec<FileOutcome> = sources
            .iter()
            .enumerate()
            .map(|(i, src)| outcome(&format!("pkg/mod_{i}.py"), src))
            .collect();

        let mut shuffled = outcomes.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        shuffled.reverse();

        let ordered = serde_json::to_string(&aggregate(outcomes)).unwrap();
        let reordered = serde_json::to_string(&aggregate(shuffled)).unwrap();
        prop_assert_eq!(ordered, reordered);
    }

    #[test]
    fn call_sites_are_sorted_by_position(src in source_strategy()) {
        if let FileOutcome::Analyzed(analysis) = outcome("m.py", &src) {
            let positions: Vec<_> = analysis.calls.iter().map(|c| c.position).collect();
            let mut sorted = positions.clone();
            sorted.sort();
            prop_assert_eq!(positions, sorted);
        }
    }

    #[test]
    fn totals_match_file_contents(sources in prop::collection::vec(source_strategy(), 0..5)) {
        let outcomes: Vec<FileOutcome> = sources
            .iter()
            .enumerate()
            .map(|(i, src)| outcome(&format!("f{i}.py"), src))
            .collect();
        let report = aggregate(outcomes);
        let endpoints: usize = report.files.iter().map(|f| f.endpoints.len()).sum();
        prop_assert_eq!(report.totals.endpoints, endpoints);
        prop_assert_eq!(
            report.totals.files_analyzed + report.totals.files_failed,
            sources.len()
        );
    }
}
