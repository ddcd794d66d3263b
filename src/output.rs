//! Routing of command output between stdout and stderr
//!
//! In output mode stdout carries only serialized objects, so narrative text is
//! either moved to stderr or dropped.

use std::{
    fmt::Display,
    io::{self, Write},
    str::FromStr,
};

use serde_json::Value;

use crate::{
    error::{Error, Result},
    mode::ExecutionMode,
    registry::TypeRegistry,
    resource::Printable,
};

const DRY_RUN_SUFFIX: &str = " (dry run)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectPrinter {
    Yaml,
    Json,
}

impl FromStr for ObjectPrinter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "yaml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(Error::validation(format!(
                "unknown output format {:?}, expected yaml or json",
                other
            ))),
        }
    }
}

impl ObjectPrinter {
    fn print(&self, value: &Value, out: &mut dyn Write) -> Result<()> {
        match self {
            Self::Yaml => {
                let text = serde_yaml_with_quirks::to_string(value)?;
                let text = text.strip_prefix("---\n").unwrap_or(&text);
                out.write_all(b"---\n")?;
                out.write_all(text.as_bytes())?;
                if !text.ends_with('\n') {
                    out.write_all(b"\n")?;
                }
            }
            Self::Json => {
                serde_json::to_writer_pretty(&mut *out, value)?;
                out.write_all(b"\n")?;
            }
        }
        Ok(())
    }
}

enum Stream {
    Primary,
    Secondary,
    Discard,
}

pub struct OutputRouter<'w> {
    dry_run: bool,
    printer: Option<ObjectPrinter>,
    registry: TypeRegistry,
    out: Box<dyn Write + 'w>,
    err: Box<dyn Write + 'w>,
}

impl OutputRouter<'static> {
    pub fn stdio(mode: &ExecutionMode) -> Result<Self> {
        Self::new(
            mode,
            TypeRegistry::builtin(),
            Box::new(io::stdout()),
            Box::new(io::stderr()),
        )
    }
}

impl<'w> OutputRouter<'w> {
    /// Fails if requested output format is not supported
    pub fn new(
        mode: &ExecutionMode,
        registry: TypeRegistry,
        out: Box<dyn Write + 'w>,
        err: Box<dyn Write + 'w>,
    ) -> Result<Self> {
        let printer = mode.output_format().map(str::parse).transpose()?;
        Ok(Self {
            dry_run: mode.is_dry_run(),
            printer,
            registry,
            out,
            err,
        })
    }

    /// Serializes objects to stdout, does nothing outside of output mode
    ///
    /// Objects without embedded identity get one from the registry. Every
    /// object is resolved before anything is written.
    pub fn emit_objects(&mut self, objects: &[&dyn Printable]) -> Result<()> {
        let Some(printer) = self.printer else {
            return Ok(());
        };
        let values = objects
            .iter()
            .map(|obj| self.printable_value(*obj))
            .collect::<Result<Vec<_>>>()?;
        for value in values.iter() {
            printer.print(value, &mut self.out)?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn printable_value(&self, obj: &dyn Printable) -> Result<Value> {
        let mut value = obj.to_value()?;
        let embedded = obj.object_kind();
        if !embedded.is_empty() {
            return Ok(value);
        }
        let kind = obj
            .resource_type()
            .and_then(|ty| self.registry.lookup(ty))
            .ok_or_else(|| {
                Error::UnknownType(
                    obj.resource_type()
                        .map(|ty| ty.to_string())
                        .unwrap_or_else(|| "untyped object".to_owned()),
                )
            })?;
        if let Value::Object(map) = &mut value {
            map.insert("apiVersion".to_owned(), Value::String(kind.api_version.clone()));
            map.insert("kind".to_owned(), Value::String(kind.kind.clone()));
        }
        Ok(value)
    }

    /// Outcome of the command, dropped in output mode
    pub fn emit_result(&mut self, line: impl Display) -> Result<()> {
        self.write_line(self.result_stream(), line, self.dry_run)
    }

    /// Progress narration, moved to stderr in output mode
    pub fn emit_status(&mut self, line: impl Display) -> Result<()> {
        self.write_line(self.status_stream(), line, self.dry_run)
    }

    pub fn emit_line(&mut self, line: impl Display) -> Result<()> {
        self.write_line(self.status_stream(), line, false)
    }

    fn result_stream(&self) -> Stream {
        if self.printer.is_some() {
            Stream::Discard
        } else {
            Stream::Primary
        }
    }

    fn status_stream(&self) -> Stream {
        if self.printer.is_some() {
            Stream::Secondary
        } else {
            Stream::Primary
        }
    }

    fn write_line(&mut self, stream: Stream, line: impl Display, dry_run: bool) -> Result<()> {
        let writer: &mut dyn Write = match stream {
            Stream::Primary => &mut self.out,
            Stream::Secondary => &mut self.err,
            Stream::Discard => return Ok(()),
        };
        let mut text = line.to_string();
        if dry_run {
            text.push_str(DRY_RUN_SUFFIX);
        }
        text.push('\n');
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::{
        registry::{ObjectKind, ResourceType},
        resource::{ClusterBuilder, Image},
    };
    use k8s_openapi::{api::core::v1::Secret, apimachinery::pkg::apis::meta::v1::ObjectMeta};
    use kube::{api::DynamicObject, core::TypeMeta};
    use serde_json::json;
    use std::{cell::Cell, sync::{Arc, Mutex}};

    /// Writer which can be inspected after being handed to a router
    #[derive(Clone, Default)]
    pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        pub fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    pub fn router(mode: &ExecutionMode) -> (OutputRouter<'static>, SharedBuf, SharedBuf) {
        router_with(mode, TypeRegistry::builtin())
    }

    fn router_with(
        mode: &ExecutionMode,
        registry: TypeRegistry,
    ) -> (OutputRouter<'static>, SharedBuf, SharedBuf) {
        let out = SharedBuf::default();
        let err = SharedBuf::default();
        let router = OutputRouter::new(
            mode,
            registry,
            Box::new(out.clone()),
            Box::new(err.clone()),
        )
        .unwrap();
        (router, out, err)
    }

    fn named_builder(name: &str) -> ClusterBuilder {
        ClusterBuilder {
            metadata: ObjectMeta {
                name: Some(name.to_owned()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Counts how often the identity is asked for a registry lookup
    struct Spy {
        inner: Image,
        lookups: Cell<usize>,
    }

    impl Printable for Spy {
        fn resource_type(&self) -> Option<ResourceType> {
            self.lookups.set(self.lookups.get() + 1);
            self.inner.resource_type()
        }
        fn object_kind(&self) -> ObjectKind {
            self.inner.object_kind()
        }
        fn to_value(&self) -> serde_json::Result<Value> {
            self.inner.to_value()
        }
    }

    #[test]
    fn dry_run_suffix() {
        for dry_run in [false, true] {
            let (mut router, out, _) = router(&ExecutionMode::new(dry_run, None, false));
            router.emit_result("\"b\" patched").unwrap();
            router.emit_status("Waiting").unwrap();
            router.emit_line("plain").unwrap();
            let suffix = if dry_run { " (dry run)" } else { "" };
            assert_eq!(
                out.text(),
                format!("\"b\" patched{suffix}\nWaiting{suffix}\nplain\n")
            );
        }
    }

    #[test]
    fn output_mode_routing() {
        let (mut router, out, err) =
            router(&ExecutionMode::new(true, Some("json".to_owned()), false));
        router.emit_result("\"b\" patched").unwrap();
        router.emit_status("Patching").unwrap();
        router.emit_line("plain").unwrap();
        assert_eq!(out.text(), "");
        assert_eq!(err.text(), "Patching (dry run)\nplain\n");
    }

    #[test]
    fn objects_ignored_in_narrative_mode() {
        let (mut router, out, err) = router(&ExecutionMode::default());
        let untyped = DynamicObject {
            types: None,
            metadata: Default::default(),
            data: json!({}),
        };
        router.emit_objects(&[&untyped]).unwrap();
        assert_eq!(out.text(), "");
        assert_eq!(err.text(), "");
    }

    #[test]
    fn identity_inferred_without_mutation() {
        let (mut router, out, _) =
            router(&ExecutionMode::new(false, Some("json".to_owned()), false));
        let builder = named_builder("default");
        router.emit_objects(&[&builder]).unwrap();

        let printed: Value = serde_json::from_str(&out.text()).unwrap();
        assert_eq!(printed["apiVersion"], json!("build.pivotal.io/v1alpha1"));
        assert_eq!(printed["kind"], json!("ClusterBuilder"));
        assert_eq!(printed["metadata"]["name"], json!("default"));
        assert!(builder.types.is_none());
    }

    #[test]
    fn set_identity_is_kept() {
        let (mut router, out, _) =
            router_with(&ExecutionMode::new(false, Some("json".to_owned()), false), TypeRegistry::default());
        let spy = Spy {
            inner: Image {
                types: Some(TypeMeta {
                    api_version: "build.pivotal.io/v1alpha2".to_owned(),
                    kind: "Image".to_owned(),
                }),
                ..Default::default()
            },
            lookups: Cell::new(0),
        };
        let before = spy.object_kind();
        router.emit_objects(&[&spy]).unwrap();

        assert_eq!(spy.lookups.get(), 0);
        assert_eq!(spy.object_kind(), before);
        let printed: Value = serde_json::from_str(&out.text()).unwrap();
        assert_eq!(printed["apiVersion"], json!("build.pivotal.io/v1alpha2"));
    }

    #[test]
    fn unknown_type_writes_nothing() {
        let (mut router, out, _) =
            router(&ExecutionMode::new(false, Some("yaml".to_owned()), false));
        let builder = named_builder("first");
        let untyped = DynamicObject {
            types: None,
            metadata: ObjectMeta {
                name: Some("mystery".to_owned()),
                ..Default::default()
            },
            data: json!({}),
        };
        let err = router.emit_objects(&[&builder, &untyped]).unwrap_err();
        assert!(matches!(err, Error::UnknownType(_)));
        assert_eq!(out.text(), "");
    }

    #[test]
    fn missing_registry_entry() {
        let (mut router, out, _) = router_with(
            &ExecutionMode::new(false, Some("json".to_owned()), false),
            TypeRegistry::default(),
        );
        let err = router.emit_objects(&[&named_builder("b")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to output. unknown type \"ClusterBuilder\""
        );
        assert_eq!(out.text(), "");
    }

    #[test]
    fn yaml_documents() {
        let (mut router, out, _) =
            router(&ExecutionMode::new(false, Some("yaml".to_owned()), false));
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some("registry-creds".to_owned()),
                ..Default::default()
            },
            ..Default::default()
        };
        router
            .emit_objects(&[&named_builder("a"), &secret])
            .unwrap();
        let text = out.text();
        assert_eq!(text.matches("---").count(), 2);
        assert!(text.contains("kind: ClusterBuilder"));
        assert!(text.contains("kind: Secret"));
        assert!(text.contains("name: registry-creds"));
    }

    #[test]
    fn unknown_format() {
        let err = OutputRouter::new(
            &ExecutionMode::new(false, Some("table".to_owned()), false),
            TypeRegistry::builtin(),
            Box::new(io::sink()),
            Box::new(io::sink()),
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::Validation(_)));
    }
}
