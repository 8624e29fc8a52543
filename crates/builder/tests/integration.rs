//! Integration tests for the packaging pipeline

#[cfg(test)]
mod tests {
    use mtspack_builder::*;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::tempdir;
    use tokio::fs;

    // The environment variable and working directory are process-global;
    // tests that touch them take this lock.
    static PROCESS_STATE: Mutex<()> = Mutex::new(());

    fn test_context(project_root: &Path, output_root: &Path) -> PackageContext {
        PackageContext {
            product: "mysqltoolsservice".to_string(),
            platform_tag: "osx".to_string(),
            python: "python3".to_string(),
            module_search_var: "PYTHONPATH".to_string(),
            project_root: project_root.to_path_buf(),
            output_root: output_root.to_path_buf(),
            build_dir: "build".to_string(),
            manifest: "requirements.txt".to_string(),
        }
    }

    async fn seed_build_output(project_root: &Path, executables: &[&str], libraries: &[&str]) {
        let build_dir = project_root.join("build");
        fs::create_dir_all(&build_dir).await.unwrap();
        for name in executables {
            fs::write(build_dir.join(name), format!("binary {name}"))
                .await
                .unwrap();
        }
        for name in libraries {
            fs::write(build_dir.join(name), format!("library {name}"))
                .await
                .unwrap();
        }
    }

    /// Write a stand-in interpreter: pip invocations succeed, the build
    /// invocation materializes the given artifacts in `build/`.
    async fn write_stub_interpreter(
        dir: &Path,
        artifacts: &[(&str, &str)],
        build_exit: i32,
    ) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let mut script = String::from("#!/bin/sh\nif [ \"$1\" = \"-m\" ]; then\n  exit 0\nfi\n");
        script.push_str("mkdir -p build\n");
        for (name, content) in artifacts {
            script.push_str(&format!("printf '{content}' > build/{name}\n"));
        }
        script.push_str("printf 'seen=%s' \"$PYTHONPATH\" > pythonpath_seen.txt\n");
        script.push_str(&format!("exit {build_exit}\n"));

        let path = dir.join("python-stub");
        fs::write(&path, script).await.unwrap();
        let mut perms = fs::metadata(&path).await.unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).await.unwrap();
        path
    }

    #[tokio::test]
    async fn assemble_moves_executable_and_copies_libraries() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        let out = temp.path().join("out");
        fs::create_dir_all(&out).await.unwrap();
        seed_build_output(
            &project,
            &["exe_mysqltoolsservice"],
            &["lib_a.so", "lib_b.so"],
        )
        .await;

        let context = test_context(&project, &out);
        let assembled = assemble_distribution(&context).await.unwrap();

        let dist = out.join("mysqltoolsservice");
        assert_eq!(assembled.dist_dir, dist);
        assert_eq!(
            fs::read(dist.join("mysqltoolsservice")).await.unwrap(),
            b"binary exe_mysqltoolsservice"
        );
        assert_eq!(
            fs::read(dist.join("lib/lib_a.so")).await.unwrap(),
            b"library lib_a.so"
        );
        assert_eq!(
            fs::read(dist.join("lib/lib_b.so")).await.unwrap(),
            b"library lib_b.so"
        );

        // The executable was moved, not copied
        assert!(!project.join("build/exe_mysqltoolsservice").exists());
    }

    #[tokio::test]
    async fn assemble_accepts_library_free_build() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        let out = temp.path().join("out");
        fs::create_dir_all(&out).await.unwrap();
        seed_build_output(&project, &["exe_mysqltoolsservice"], &[]).await;

        let context = test_context(&project, &out);
        let assembled = assemble_distribution(&context).await.unwrap();

        assert!(assembled.libraries.is_empty());
        assert!(assembled.executable.exists());

        let mut entries = fs::read_dir(out.join("mysqltoolsservice/lib")).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn assemble_fails_without_executable() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        let out = temp.path().join("out");
        fs::create_dir_all(&out).await.unwrap();
        seed_build_output(&project, &[], &["lib_a.so"]).await;

        let context = test_context(&project, &out);
        let err = assemble_distribution(&context).await.unwrap_err();

        assert!(matches!(
            err,
            mtspack_errors::Error::Artifact(mtspack_errors::ArtifactError::Missing { .. })
        ));
        // Nothing was mutated
        assert!(!out.join("mysqltoolsservice").exists());
    }

    #[tokio::test]
    async fn assemble_fails_with_ambiguous_executables() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        let out = temp.path().join("out");
        fs::create_dir_all(&out).await.unwrap();
        seed_build_output(
            &project,
            &["exe_mysqltoolsservice", "exe_leftover"],
            &[],
        )
        .await;

        let context = test_context(&project, &out);
        let err = assemble_distribution(&context).await.unwrap_err();

        match err {
            mtspack_errors::Error::Artifact(mtspack_errors::ArtifactError::Ambiguous {
                count,
                ..
            }) => assert_eq!(count, 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!out.join("mysqltoolsservice").exists());
    }

    #[tokio::test]
    async fn assemble_replaces_stale_distribution() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        let out = temp.path().join("out");
        fs::create_dir_all(out.join("mysqltoolsservice")).await.unwrap();
        fs::write(out.join("mysqltoolsservice/stale"), b"old run")
            .await
            .unwrap();
        seed_build_output(&project, &["exe_mysqltoolsservice"], &[]).await;

        let context = test_context(&project, &out);
        assemble_distribution(&context).await.unwrap();

        assert!(!out.join("mysqltoolsservice/stale").exists());
        assert!(out.join("mysqltoolsservice/mysqltoolsservice").exists());
    }

    #[tokio::test]
    async fn artifact_rule_sorts_matches() {
        let temp = tempdir().unwrap();
        seed_build_output(temp.path(), &[], &["lib_z.so", "lib_a.so", "lib_m.so"]).await;

        let rule = ArtifactRule {
            prefix: LIBRARY_PREFIX,
            cardinality: Cardinality::ZeroOrMore,
        };
        let matches = rule.select(&temp.path().join("build")).await.unwrap();
        let names: Vec<_> = matches
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["lib_a.so", "lib_m.so", "lib_z.so"]);
    }

    async fn extract_archive(archive: &Path, dest: &Path) -> PathBuf {
        use async_compression::tokio::bufread::GzipDecoder;
        use tokio::io::BufReader;

        let file = fs::File::open(archive).await.unwrap();
        let mut decoder = GzipDecoder::new(BufReader::new(file));
        let tar_path = dest.join("archive.tar");
        let mut tar_file = fs::File::create(&tar_path).await.unwrap();
        tokio::io::copy(&mut decoder, &mut tar_file).await.unwrap();

        let extracted = dest.join("extracted");
        let tar = std::fs::File::open(&tar_path).unwrap();
        tar::Archive::new(tar).unpack(&extracted).unwrap();
        extracted
    }

    #[tokio::test]
    async fn archive_round_trip_reproduces_layout() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        let out = temp.path().join("out");
        fs::create_dir_all(&out).await.unwrap();
        seed_build_output(
            &project,
            &["exe_mysqltoolsservice"],
            &["lib_a.so", "lib_b.so"],
        )
        .await;

        let context = test_context(&project, &out);
        assemble_distribution(&context).await.unwrap();
        let archive = create_archive(&context).await.unwrap();

        assert_eq!(archive.path, out.join("mysqltoolsservice-osx.tar.gz"));
        assert!(archive.size > 0);

        // Every entry lives under the distribution directory
        let extracted = extract_archive(&archive.path, temp.path()).await;
        let tar = std::fs::File::open(temp.path().join("archive.tar")).unwrap();
        let mut reader = tar::Archive::new(tar);
        for entry in reader.entries().unwrap() {
            let entry = entry.unwrap();
            let path = entry.path().unwrap().into_owned();
            assert!(
                path.starts_with("mysqltoolsservice"),
                "unexpected top-level entry: {}",
                path.display()
            );
        }

        let root = extracted.join("mysqltoolsservice");
        assert_eq!(
            fs::read(root.join("mysqltoolsservice")).await.unwrap(),
            b"binary exe_mysqltoolsservice"
        );
        assert_eq!(
            fs::read(root.join("lib/lib_a.so")).await.unwrap(),
            b"library lib_a.so"
        );
        assert_eq!(
            fs::read(root.join("lib/lib_b.so")).await.unwrap(),
            b"library lib_b.so"
        );
    }

    #[tokio::test]
    async fn archive_is_deterministic() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        let out = temp.path().join("out");
        fs::create_dir_all(&out).await.unwrap();
        seed_build_output(&project, &["exe_mysqltoolsservice"], &["lib_a.so"]).await;

        let context = test_context(&project, &out);
        assemble_distribution(&context).await.unwrap();

        let first = create_archive(&context).await.unwrap();
        let first_bytes = fs::read(&first.path).await.unwrap();

        // A rerun replaces the stale archive with identical bytes
        let second = create_archive(&context).await.unwrap();
        let second_bytes = fs::read(&second.path).await.unwrap();
        assert_eq!(first_bytes, second_bytes);
    }

    #[tokio::test]
    async fn workdir_context_restores_on_drop() {
        let _guard = PROCESS_STATE
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let temp = tempdir().unwrap();
        let original = std::env::current_dir().unwrap();

        {
            let context = WorkdirContext::enter(temp.path()).unwrap();
            assert_eq!(context.original(), original.as_path());
            assert_eq!(
                std::env::current_dir().unwrap(),
                temp.path().canonicalize().unwrap()
            );
        }

        assert_eq!(std::env::current_dir().unwrap(), original);
    }

    #[tokio::test]
    async fn pipeline_packages_end_to_end() {
        let _guard = PROCESS_STATE
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        let out = temp.path().join("out");
        fs::create_dir_all(&project).await.unwrap();
        fs::create_dir_all(&out).await.unwrap();
        fs::write(project.join("requirements.txt"), "mysql-connector==8.0\n")
            .await
            .unwrap();

        let stub = write_stub_interpreter(
            temp.path(),
            &[
                ("exe_mysqltoolsservice", "service binary"),
                ("lib_a.so", "alpha"),
                ("lib_b.so", "beta"),
            ],
            0,
        )
        .await;

        std::env::set_var("PYTHONPATH", "/caller/site-packages");
        let original_dir = std::env::current_dir().unwrap();

        let mut context = test_context(&project, &out);
        context.python = stub.display().to_string();

        let report = package(&context).await.unwrap();

        // Caller state is untouched
        assert_eq!(std::env::var("PYTHONPATH").unwrap(), "/caller/site-packages");
        assert_eq!(std::env::current_dir().unwrap(), original_dir);
        std::env::remove_var("PYTHONPATH");

        // The build tool saw the masked variable
        assert_eq!(
            fs::read_to_string(project.join("pythonpath_seen.txt"))
                .await
                .unwrap(),
            "seen="
        );

        assert_eq!(report.libraries, 2);
        let dist = out.join("mysqltoolsservice");
        assert_eq!(report.dist_dir, dist);
        assert!(dist.join("mysqltoolsservice").exists());
        assert!(dist.join("lib/lib_a.so").exists());
        assert!(dist.join("lib/lib_b.so").exists());
        assert!(out.join("mysqltoolsservice-osx.tar.gz").exists());
    }

    #[tokio::test]
    async fn pipeline_build_failure_leaves_no_outputs() {
        let _guard = PROCESS_STATE
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        let out = temp.path().join("out");
        fs::create_dir_all(&project).await.unwrap();
        fs::create_dir_all(&out).await.unwrap();
        fs::write(project.join("requirements.txt"), "mysql-connector==8.0\n")
            .await
            .unwrap();

        let stub = write_stub_interpreter(temp.path(), &[], 1).await;

        std::env::set_var("PYTHONPATH", "/caller/site-packages");
        let original_dir = std::env::current_dir().unwrap();

        let mut context = test_context(&project, &out);
        context.python = stub.display().to_string();

        let err = package(&context).await.unwrap_err();
        assert!(matches!(err, mtspack_errors::Error::Build(_)));

        // Caller state restored even on failure
        assert_eq!(std::env::var("PYTHONPATH").unwrap(), "/caller/site-packages");
        assert_eq!(std::env::current_dir().unwrap(), original_dir);
        std::env::remove_var("PYTHONPATH");

        // No distribution directory, no archive
        assert!(!out.join("mysqltoolsservice").exists());
        assert!(!out.join("mysqltoolsservice-osx.tar.gz").exists());
    }

    #[tokio::test]
    async fn pipeline_aborts_without_manifest() {
        let _guard = PROCESS_STATE
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        let out = temp.path().join("out");
        fs::create_dir_all(&project).await.unwrap();
        fs::create_dir_all(&out).await.unwrap();

        let stub = write_stub_interpreter(temp.path(), &[], 0).await;

        let mut context = test_context(&project, &out);
        context.python = stub.display().to_string();

        let err = package(&context).await.unwrap_err();
        assert!(matches!(
            err,
            mtspack_errors::Error::Deps(mtspack_errors::DepsError::ManifestMissing { .. })
        ));

        // The build never ran
        assert!(!project.join("build").exists());
        assert!(!out.join("mysqltoolsservice").exists());
    }
}
