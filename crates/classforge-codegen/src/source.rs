//! Small Java source writer: package line, sorted imports, indented body.

use crate::java_types::imports_for;
use std::collections::BTreeSet;

const INDENT: &str = "    ";

#[derive(Debug)]
pub struct JavaSource {
    package: String,
    imports: BTreeSet<String>,
    body: String,
    depth: usize,
}

impl JavaSource {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            imports: BTreeSet::new(),
            body: String::new(),
            depth: 0,
        }
    }

    pub fn import(&mut self, path: impl Into<String>) {
        self.imports.insert(path.into());
    }

    /// Import whatever the standard library types mentioned in `java_type` need.
    pub fn import_type(&mut self, java_type: &str) {
        for import in imports_for(java_type) {
            self.imports.insert(import.to_string());
        }
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.body.push_str(INDENT);
            }
            self.body.push_str(text);
        }
        self.body.push('\n');
    }

    pub fn blank(&mut self) {
        self.body.push('\n');
    }

    /// `text {` and indent.
    pub fn open(&mut self, text: impl AsRef<str>) {
        self.line(format!("{} {{", text.as_ref()));
        self.depth += 1;
    }

    /// Dedent and `}`.
    pub fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    /// Javadoc block; empty input writes nothing.
    pub fn doc(&mut self, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        self.line("/**");
        for line in lines {
            if line.is_empty() {
                self.line(" *");
            } else {
                self.line(format!(" * {line}"));
            }
        }
        self.line(" */");
    }

    pub fn finish(mut self) -> String {
        while self.body.ends_with("\n\n") {
            self.body.pop();
        }
        let mut out = format!("package {};\n\n", self.package);

        // jakarta/javax, then java, then everything else
        let group = |path: &str| -> u8 {
            if path.starts_with("jakarta.") || path.starts_with("javax.") {
                0
            } else if path.starts_with("java.") {
                1
            } else {
                2
            }
        };
        let mut imports: Vec<&String> = self.imports.iter().collect();
        imports.sort_by_key(|p| group(p));
        let mut last_group = None;
        for path in imports {
            let g = group(path);
            if last_group.is_some_and(|l| l != g) {
                out.push('\n');
            }
            last_group = Some(g);
            out.push_str(&format!("import {path};\n"));
        }
        if last_group.is_some() {
            out.push('\n');
        }
        out.push_str(&self.body);
        out
    }
}
