//! Fixture builders for runtime installations and app layouts.

use std::path::PathBuf;

use super::{MockHost, MockProcessOutput};

/// A fake JDK laid out on a [`MockHost`].
///
/// By default the root holds `lib/server/libjvm.so` and `bin/java`, no
/// `release` file, and running `bin/java` fails.
#[derive(Debug, Clone)]
pub struct JdkFixture {
    root: PathBuf,
    release: Option<String>,
    properties: Vec<(String, String)>,
    with_lib: bool,
}

impl JdkFixture {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JdkFixture {
            root: root.into(),
            release: None,
            properties: Vec::new(),
            with_lib: true,
        }
    }

    /// Contents of the `release` manifest.
    pub fn release(mut self, content: &str) -> Self {
        self.release = Some(content.to_string());
        self
    }

    /// Properties reported by `bin/java -XshowSettings:properties`.
    pub fn properties(mut self, props: &[(&str, &str)]) -> Self {
        self.properties = props
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    pub fn without_lib(mut self) -> Self {
        self.with_lib = false;
        self
    }

    pub fn install(&self, host: &mut MockHost) {
        host.add_dir(&self.root);
        if self.with_lib {
            host.add_file(self.root.join("lib/server/libjvm.so"), "");
        }
        let java = self.root.join("bin/java");
        host.add_file(&java, "");

        if let Some(ref release) = self.release {
            host.add_file(self.root.join("release"), release.as_str());
        }
        if !self.properties.is_empty() {
            let mut report = String::from("Property settings:\n");
            for (key, value) in &self.properties {
                report.push_str(&format!("    {} = {}\n", key, value));
            }
            report.push_str("\nopenjdk version \"unknown\"\n");
            host.expect_run(java, MockProcessOutput::stderr(report));
        }
    }
}

/// Config files beneath an application directory on a [`MockHost`].
#[derive(Debug, Clone)]
pub struct AppFixture {
    app_dir: PathBuf,
    config_dir: String,
    files: Vec<(String, String)>,
}

impl AppFixture {
    /// An app whose config lives in `<app_dir>/launchpad/`.
    pub fn new(app_dir: impl Into<PathBuf>) -> Self {
        AppFixture {
            app_dir: app_dir.into(),
            config_dir: "launchpad".to_string(),
            files: Vec::new(),
        }
    }

    /// Use a different config directory name, relative to the app dir.
    pub fn config_dir(mut self, dir: &str) -> Self {
        self.config_dir = dir.to_string();
        self
    }

    pub fn file(mut self, name: &str, content: &str) -> Self {
        self.files.push((name.to_string(), content.to_string()));
        self
    }

    pub fn executable(&self, name: &str) -> PathBuf {
        self.app_dir.join(name)
    }

    pub fn install(&self, host: &mut MockHost) {
        let dir = self.app_dir.join(&self.config_dir);
        host.add_dir(&dir);
        for (name, content) in &self.files {
            host.add_file(dir.join(name), content.as_str());
        }
    }
}
