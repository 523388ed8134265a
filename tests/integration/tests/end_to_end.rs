//! End-to-end tests of a validation run
//!
//! Each test builds a project tree on disk, runs the orchestrator over it
//! and checks the report, the dispatched files and the exit code.

use std::error::Error;
use std::fs;

use assert_fs::prelude::*;
use pretty_assertions::assert_eq;
use vvv_core::{
    EXIT_SUCCESS, EXIT_VIOLATIONS, Entry, MatchList, Orchestrator, RunConfig, is_whitelisted,
    walk,
};

type TestResult = Result<(), Box<dyn Error>>;

fn run(temp: &assert_fs::TempDir) -> vvv_core::RunReport {
    Orchestrator::new(RunConfig::new().project(temp.path()).target(temp.path()))
        .run()
        .unwrap()
}

mod builtin_validators {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn breakpoint_in_one_file_dotted_paths_pruned() -> TestResult {
        let temp = assert_fs::TempDir::new()?;
        temp.child("a.py").write_str("def f():\n    import pdb; pdb.set_trace()\n")?;
        temp.child("b.py").write_str("def f():\n    return 1\n")?;
        temp.child(".git/config").write_str("import pdb; pdb.set_trace()\n")?;

        let report = run(&temp);

        let entries = report.reporter.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path(), Some("a.py"));
        assert_eq!(entries[0].plugin_id(), "pdb");
        assert!(entries.iter().all(|e| !e.render().contains(".git")));
        assert_eq!(
            report.files.iter().map(|f| f.path.as_str()).collect::<Vec<_>>(),
            vec!["a.py", "b.py"]
        );
        assert_eq!(report.exit_code(), EXIT_VIOLATIONS);
        Ok(())
    }

    #[test]
    fn empty_tree_passes() -> TestResult {
        let temp = assert_fs::TempDir::new()?;

        let report = run(&temp);

        assert!(report.output.is_empty());
        assert_eq!(report.exit_code(), EXIT_SUCCESS);
        Ok(())
    }

    #[test]
    fn default_global_patterns_skip_build_output() -> TestResult {
        let temp = assert_fs::TempDir::new()?;
        for dir in ["node_modules", "__pycache__", "target", "build", "dist", "pkg.egg-info"] {
            temp.child(format!("{}/x.py", dir)).write_str("\tbreakpoint()\n")?;
        }
        temp.child("cache.pyc").write_binary(b"\x00\x01")?;
        temp.child("src/ok.py").write_str("x = 1\n")?;

        let report = run(&temp);

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].path, "src/ok.py");
        assert_eq!(report.exit_code(), EXIT_SUCCESS);
        Ok(())
    }

    #[test]
    fn binary_files_are_not_validated() -> TestResult {
        let temp = assert_fs::TempDir::new()?;
        temp.child("image.png")
            .write_binary(b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\t\t\t")?;

        let report = run(&temp);

        assert_eq!(report.files.len(), 1);
        assert!(report.files[0].plugins.is_empty());
        assert_eq!(report.exit_code(), EXIT_SUCCESS);
        Ok(())
    }

    #[test]
    fn undecodable_text_passes() -> TestResult {
        let temp = assert_fs::TempDir::new()?;
        temp.child("latin1.txt").write_binary(b"caf\xe9\tau lait\n")?;

        let report = run(&temp);

        assert_eq!(report.exit_code(), EXIT_SUCCESS);
        Ok(())
    }
}

mod matching {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn walker_and_single_file_check_agree() -> TestResult {
        let temp = assert_fs::TempDir::new()?;
        temp.child("src/a.py").touch()?;
        temp.child("src/generated/b.py").touch()?;
        temp.child("docs/index.rst").touch()?;
        let matchlist = MatchList::new(["*", "!generated"])?;

        let walked: Vec<_> = walk(temp.path(), &matchlist).collect();

        assert_eq!(walked, vec!["docs/index.rst", "src/a.py"]);
        assert!(is_whitelisted(&temp.path().join("src/a.py"), temp.path(), &matchlist));
        assert!(!is_whitelisted(
            &temp.path().join("src/generated/b.py"),
            temp.path(),
            &matchlist
        ));
        Ok(())
    }

    #[test]
    fn plugin_patterns_from_files_file() -> TestResult {
        let temp = assert_fs::TempDir::new()?;
        temp.child("validation-files.yaml").write_str(
            "all: |\n  *\n  !.*\n  !*.yaml\nlinelength:\n  - \"*\"\n  - \"!*.csv\"\n",
        )?;
        temp.child("validation-options.yaml")
            .write_str("linelength:\n  length: 20\n")?;
        temp.child("data.csv")
            .write_str("a,b,c,d,e,f,g,h,i,j,k,l,m,n,o,p\n")?;
        temp.child("notes.txt")
            .write_str("this line is definitely longer than twenty\n")?;

        let report = run(&temp);

        let paths: Vec<_> = report
            .reporter
            .entries()
            .iter()
            .filter_map(|e| e.path().map(str::to_string))
            .collect();
        assert_eq!(paths, vec!["notes.txt"]);
        assert!(report.output.contains("must not exceed 20 characters"));
        Ok(())
    }

    #[test]
    fn later_pattern_reincludes_file() -> TestResult {
        let temp = assert_fs::TempDir::new()?;
        temp.child("validation-files.yaml")
            .write_str("all:\n  - \"*\"\n  - \"!*.log\"\n  - \"keep.log\"\n")?;
        temp.child("drop.log").write_str("x\n")?;
        temp.child("keep.log").write_str("x\n")?;

        let report = run(&temp);

        let paths: Vec<_> = report.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["keep.log", "validation-files.yaml"]);
        Ok(())
    }
}

#[cfg(unix)]
mod command_validators {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(path: &std::path::Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn fail_fast_stops_remaining_plugins_and_files() -> TestResult {
        let temp = assert_fs::TempDir::new()?;
        let log = assert_fs::TempDir::new()?;
        let log_file = log.path().join("calls.log");
        let script = |id: &str| {
            format!(
                "  - id: {id}\n    command: sh\n    args: [\"-c\", \"echo {id} $(basename $0) >> {log}; grep -q BAD $0 && exit 1; exit 0\"]\n",
                id = id,
                log = log_file.display()
            )
        };
        temp.child("validation-options.yaml").write_str(&format!(
            "commands:\n{}{}",
            script("first"),
            script("second")
        ))?;
        temp.child("1.txt").write_str("BAD\n")?;
        temp.child("2.txt").write_str("BAD\n")?;

        let report = Orchestrator::new(
            RunConfig::new()
                .project(temp.path())
                .target(temp.path())
                .abort_on_first_error(true),
        )
        .run()?;

        assert!(report.aborted);
        assert_eq!(lines(&log_file), vec!["first 1.txt"]);
        assert_eq!(report.reporter.entries().len(), 1);
        assert_eq!(report.exit_code(), EXIT_VIOLATIONS);
        Ok(())
    }

    #[test]
    fn without_fail_fast_every_pair_runs() -> TestResult {
        let temp = assert_fs::TempDir::new()?;
        let log = assert_fs::TempDir::new()?;
        let log_file = log.path().join("calls.log");
        temp.child("validation-options.yaml").write_str(&format!(
            "linelength:\n  enabled: false\ncommands:\n  - id: first\n    command: sh\n    args: [\"-c\", \"echo first $(basename $0) >> {log}; exit 1\"]\n    files: [\"*.txt\"]\n  - id: second\n    command: sh\n    args: [\"-c\", \"echo second $(basename $0) >> {log}\"]\n    files: [\"*.txt\"]\n",
            log = log_file.display()
        ))?;
        temp.child("1.txt").write_str("x\n")?;
        temp.child("2.txt").write_str("x\n")?;

        let report = run(&temp);

        assert_eq!(
            lines(&log_file),
            vec!["first 1.txt", "second 1.txt", "first 2.txt", "second 2.txt"]
        );
        // Two failures of the same validator, one hint.
        assert_eq!(report.reporter.entries().len(), 2);
        assert_eq!(report.reporter.hints().len(), 1);
        Ok(())
    }

    #[test]
    fn install_on_demand_runs_once() -> TestResult {
        let temp = assert_fs::TempDir::new()?;
        temp.child("validation-options.yaml").write_str(
            "linelength:\n  enabled: false\ncommands:\n  - id: checker\n    command: checker\n    files: [\"*.txt\"]\n    install: \"echo run >> installs.log; mkdir -p bin && printf '#!/bin/sh\\nexit 0\\n' > bin/checker && chmod +x bin/checker\"\n",
        )?;
        temp.child("a.txt").write_str("x\n")?;
        temp.child("b.txt").write_str("x\n")?;

        let report = run(&temp);

        let install_dir = temp.path().join(".vvv/checker");
        assert_eq!(lines(&install_dir.join("installs.log")), vec!["run"]);
        assert!(install_dir.join("bin/checker").exists());
        assert_eq!(report.exit_code(), EXIT_SUCCESS);
        for file in &report.files {
            assert!(file.plugins.contains(&"checker".to_string()), "{}", file.path);
        }
        Ok(())
    }

    #[test]
    fn missing_system_dependency_is_reported_once() -> TestResult {
        let temp = assert_fs::TempDir::new()?;
        temp.child("validation-options.yaml").write_str(
            "commands:\n  - id: javalint\n    command: javalint\n    requires: [vvv-test-missing-java]\n    install: \"true\"\n",
        )?;
        temp.child("a.txt").write_str("\tx\n")?;
        temp.child("b.txt").write_str("y\n")?;

        let report = run(&temp);

        let internal: Vec<_> = report
            .reporter
            .entries()
            .into_iter()
            .filter(|e| matches!(e, Entry::InternalError { .. }))
            .collect();
        assert_eq!(internal.len(), 1);
        assert!(internal[0].render().contains("vvv-test-missing-java"));
        // Sibling validators keep running.
        assert_eq!(report.reporter.finding_count(), 1);
        assert_eq!(report.exit_code(), EXIT_VIOLATIONS);
        Ok(())
    }
}
