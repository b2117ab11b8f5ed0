//! Sandcastle Help File Builder project generation.
//!
//! A descriptor is an MSBuild project with one `PropertyGroup` holding the
//! help build settings and the documentation sources. Everything except the
//! source paths and the `ProjectGuid` comes from [`DescriptorSettings`], whose
//! defaults are the fixed template values.
//!
//! ```text
//! <Project xmlns="…/msbuild/2003">
//!   <Import Microsoft.Common.props />          (if the props file exists)
//!   <PropertyGroup> settings + sources </PropertyGroup>
//!   <Import Microsoft.Common.targets />        (restore sessions only)
//!   <Import SandcastleHelpFileBuilder.targets /> (normal builds)
//! </Project>
//! ```

use crate::error::{DocbuildError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const MSBUILD_NAMESPACE: &str = "http://schemas.microsoft.com/developer/msbuild/2003";

const COMMON_PROPS: &str =
    r"$(MSBuildExtensionsPath)\$(MSBuildToolsVersion)\Microsoft.Common.props";
const COMMON_TARGETS: &str = r"$(MSBuildToolsPath)\Microsoft.Common.targets";
const SHFB_TARGETS: &str = r"$(SHFBROOT)\SandcastleHelpFileBuilder.targets";
const RESTORE_SESSION: &str = "'$(MSBuildRestoreSessionId)'";

// ---------------------------------------------------------------------------
// DescriptorSettings
// ---------------------------------------------------------------------------

/// The constant part of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorSettings {
    pub schema_version: String,
    pub shfb_schema_version: String,
    pub name: String,
    pub framework_version: String,
    pub output_path: String,
    pub html_help_name: String,
    pub language: String,
    pub help_file_format: String,
    pub syntax_filters: String,
    pub presentation_style: String,
    pub clean_intermediates: bool,
    pub keep_log_file: bool,
    pub disable_code_block_component: bool,
    pub indent_html: bool,
    pub build_assembler_verbosity: String,
    pub save_component_cache_capacity: u32,
}

impl Default for DescriptorSettings {
    fn default() -> Self {
        Self {
            schema_version: "2.0".to_string(),
            shfb_schema_version: "2017.9.26.0".to_string(),
            name: "Documentation".to_string(),
            framework_version: ".NET Framework 4.5".to_string(),
            output_path: r".\Help\".to_string(),
            html_help_name: "Documentation".to_string(),
            language: "ru-RU".to_string(),
            help_file_format: "HtmlHelp1".to_string(),
            syntax_filters: "Standard".to_string(),
            presentation_style: "VS2013".to_string(),
            clean_intermediates: true,
            keep_log_file: true,
            disable_code_block_component: false,
            indent_html: true,
            build_assembler_verbosity: "OnlyWarningsAndErrors".to_string(),
            save_component_cache_capacity: 100,
        }
    }
}

impl DescriptorSettings {
    /// File name the build tool produces for the configured help format.
    ///
    /// `help_file_format` may list several formats (`HtmlHelp1, Website`);
    /// the first one decides.
    pub fn artifact_file_name(&self) -> String {
        let primary = self
            .help_file_format
            .split(',')
            .next()
            .map(str::trim)
            .unwrap_or_default();
        match primary {
            "MSHelpViewer" => format!("{}.mshc", self.html_help_name),
            "OpenXml" => format!("{}.docx", self.html_help_name),
            "Website" => "index.html".to_string(),
            "Markdown" => "index.md".to_string(),
            _ => format!("{}.chm", self.html_help_name),
        }
    }

    /// Expected artifact location relative to the project root.
    pub fn artifact_path(&self) -> PathBuf {
        paths::normalize_separators(&self.output_path).join(self.artifact_file_name())
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentationSource {
    pub source_file: String,
}

impl DocumentationSource {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub project_guid: Uuid,
    pub settings: DescriptorSettings,
    pub sources: Vec<DocumentationSource>,
}

impl Descriptor {
    /// Build a descriptor with a freshly generated `ProjectGuid`.
    pub fn new(sources: Vec<DocumentationSource>, settings: DescriptorSettings) -> Self {
        Self::with_guid(Uuid::new_v4(), sources, settings)
    }

    pub fn with_guid(
        project_guid: Uuid,
        sources: Vec<DocumentationSource>,
        settings: DescriptorSettings,
    ) -> Self {
        Self {
            project_guid,
            settings,
            sources,
        }
    }

    /// Serialize to MSBuild project XML.
    pub fn render(&self) -> String {
        let s = &self.settings;
        let props_condition = format!("Exists('{COMMON_PROPS}')");
        let restore_condition = format!("{RESTORE_SESSION} != ''");
        let build_condition = format!("{RESTORE_SESSION} == ''");
        let mut w = MarkupWriter::new();

        w.open("Project", &[("xmlns", MSBUILD_NAMESPACE)]);
        w.empty(
            "Import",
            &[
                ("Project", COMMON_PROPS),
                ("Condition", props_condition.as_str()),
            ],
        );

        w.open("PropertyGroup", &[]);
        w.text("SchemaVersion", &s.schema_version);
        w.text("ProjectGuid", &self.project_guid.to_string());
        w.text("SHFBSchemaVersion", &s.shfb_schema_version);
        w.text("Name", &s.name);
        w.text("FrameworkVersion", &s.framework_version);
        w.text("OutputPath", &s.output_path);
        w.text("HtmlHelpName", &s.html_help_name);
        w.text("Language", &s.language);
        if self.sources.is_empty() {
            w.empty("DocumentationSources", &[]);
        } else {
            w.open("DocumentationSources", &[]);
            for src in &self.sources {
                w.empty("DocumentationSource", &[("sourceFile", src.source_file.as_str())]);
            }
            w.close("DocumentationSources");
        }
        w.text("HelpFileFormat", &s.help_file_format);
        w.text("SyntaxFilters", &s.syntax_filters);
        w.text("PresentationStyle", &s.presentation_style);
        w.text("CleanIntermediates", bool_str(s.clean_intermediates));
        w.text("KeepLogFile", bool_str(s.keep_log_file));
        w.text(
            "DisableCodeBlockComponent",
            bool_str(s.disable_code_block_component),
        );
        w.text("IndentHtml", bool_str(s.indent_html));
        w.text("BuildAssemblerVerbosity", &s.build_assembler_verbosity);
        w.text(
            "SaveComponentCacheCapacity",
            &s.save_component_cache_capacity.to_string(),
        );
        w.close("PropertyGroup");

        w.empty(
            "Import",
            &[
                ("Project", COMMON_TARGETS),
                ("Condition", restore_condition.as_str()),
            ],
        );
        w.empty(
            "Import",
            &[
                ("Project", SHFB_TARGETS),
                ("Condition", build_condition.as_str()),
            ],
        );
        w.close("Project");

        w.finish()
    }

    /// Fail if any source path or setting holds a character XML 1.0 cannot
    /// carry, even escaped (most C0 controls, U+FFFE, U+FFFF).
    pub fn check_representable(&self) -> Result<()> {
        let s = &self.settings;
        let mut fields: Vec<(String, &str)> = vec![
            ("schema_version".into(), s.schema_version.as_str()),
            ("shfb_schema_version".into(), s.shfb_schema_version.as_str()),
            ("name".into(), s.name.as_str()),
            ("framework_version".into(), s.framework_version.as_str()),
            ("output_path".into(), s.output_path.as_str()),
            ("html_help_name".into(), s.html_help_name.as_str()),
            ("language".into(), s.language.as_str()),
            ("help_file_format".into(), s.help_file_format.as_str()),
            ("syntax_filters".into(), s.syntax_filters.as_str()),
            ("presentation_style".into(), s.presentation_style.as_str()),
            ("build_assembler_verbosity".into(), s.build_assembler_verbosity.as_str()),
        ];
        for (i, src) in self.sources.iter().enumerate() {
            fields.push((format!("source {}", i + 1), src.source_file.as_str()));
        }
        for (field, value) in fields {
            if let Some(c) = value.chars().find(|c| !is_xml_char(*c)) {
                return Err(DocbuildError::UnrepresentableText {
                    field,
                    code: c as u32,
                });
            }
        }
        Ok(())
    }

    /// Render and write to `path`, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        self.check_representable()?;
        crate::io::write_replacing(path, self.render().as_bytes()).map_err(|source| {
            DocbuildError::DescriptorWrite {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::info!(
            path = %path.display(),
            guid = %self.project_guid,
            sources = self.sources.len(),
            "wrote descriptor"
        );
        Ok(())
    }
}

/// A descriptor that has been written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct WrittenDescriptor {
    pub path: PathBuf,
    pub project_guid: Uuid,
}

/// Write a descriptor referencing `metadata_source` (the XML doc comments
/// file) and `assembly_source` (the compiled assembly) to `dir/file_name`.
///
/// Paths go into the descriptor verbatim; nothing checks that they exist.
pub fn generate(
    dir: &Path,
    file_name: &str,
    metadata_source: &str,
    assembly_source: &str,
    settings: &DescriptorSettings,
) -> Result<WrittenDescriptor> {
    let descriptor = Descriptor::new(
        vec![
            DocumentationSource::new(metadata_source),
            DocumentationSource::new(assembly_source),
        ],
        settings.clone(),
    );
    let path = dir.join(file_name);
    descriptor.write_to(&path)?;
    Ok(WrittenDescriptor {
        path,
        project_guid: descriptor.project_guid,
    })
}

fn bool_str(v: bool) -> &'static str {
    if v {
        "true"
    } else {
        "false"
    }
}

// ---------------------------------------------------------------------------
// MarkupWriter
// ---------------------------------------------------------------------------

struct MarkupWriter {
    out: String,
    depth: usize,
}

impl MarkupWriter {
    fn new() -> Self {
        let mut out = String::with_capacity(2048);
        out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        Self { out, depth: 0 }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    fn start_tag(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.indent();
        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attrs {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            escape_into(&mut self.out, value, true);
            self.out.push('"');
        }
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.start_tag(name, attrs);
        self.out.push_str(">\n");
        self.depth += 1;
    }

    fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push_str(">\n");
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.start_tag(name, attrs);
        self.out.push_str(" />\n");
    }

    fn text(&mut self, name: &str, value: &str) {
        self.start_tag(name, &[]);
        self.out.push('>');
        escape_into(&mut self.out, value, false);
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push_str(">\n");
    }

    fn finish(self) -> String {
        self.out
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Escape `& < >` and CR everywhere; in attributes also `"`, tab and LF so
/// they survive attribute-value normalization. Attribute values are always
/// double-quoted, so `'` is written as is.
fn escape_into(out: &mut String, value: &str, attribute: bool) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\n' if attribute => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            '\t' if attribute => out.push_str("&#x9;"),
            _ => out.push(c),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
