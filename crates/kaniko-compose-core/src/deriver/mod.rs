//! タスク導出
//!
//! マニフェストの `services` をマニフェスト順に走査し、1サービスにつき1つの
//! `BuildTask` を生成します。不正なエントリは警告付きでスキップされます。

mod service;


use crate::config::RunConfig;
use crate::env::EnvVars;
use crate::error::{ComposeError, Result};
use crate::loader::Manifest;
use crate::log::LogHandle;
use crate::model::{BuildTask, ImageClaim, SkippedService};
use serde_yaml::Value;
use service::{BuildConfig, BuildSection, ImageEntry, ServiceDefinition, scalar_to_string};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};

pub const SKIP_EMPTY: &str = "service is empty";
pub const SKIP_NO_IMAGE: &str = "no image specified";
pub const SKIP_INVALID_IMAGE: &str = "invalid image";
pub const SKIP_NO_BUILD: &str = "no build section";
pub const SKIP_INVALID_BUILD: &str = "invalid build section";

/// 導出結果
#[derive(Debug, Clone, Default)]
pub struct Derivation {
    /// 実行対象のタスク（マニフェスト順）
    pub tasks: Vec<BuildTask>,
    /// スキップされたサービス（マニフェスト順）
    pub skipped: Vec<SkippedService>,
    /// イメージを宣言した全サービス（重複検出用）
    pub claims: Vec<ImageClaim>,
    /// 全サービス名（マニフェスト順）
    pub services: Vec<String>,
}

impl Derivation {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// マニフェストからビルドタスクを導出する
pub struct TaskDeriver<'a> {
    config: Arc<RunConfig>,
    env: &'a EnvVars,
    base_dir: PathBuf,
}

impl<'a> TaskDeriver<'a> {
    pub fn new(config: Arc<RunConfig>, env: &'a EnvVars, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            env,
            base_dir: base_dir.into(),
        }
    }

    /// `services` マッピングを走査してタスクを導出する
    #[instrument(skip_all)]
    pub fn derive(&self, document: &Value, log: &LogHandle) -> Result<Derivation> {
        let services = match document.get("services") {
            Some(Value::Mapping(services)) => services,
            _ => {
                log.run_error("No services found in compose file.");
                return Err(ComposeError::NoServices);
            }
        };

        let mut derivation = Derivation::default();

        for (name, value) in services {
            let name = scalar_to_string(name);
            derivation.services.push(name.clone());

            let Some(definition) = ServiceDefinition::from_value(value) else {
                log.warn(&name, format!("Service {} is empty (null), skipping.", name));
                derivation.skipped.push(skipped(&name, None, SKIP_EMPTY));
                continue;
            };

            let image = match &definition.image {
                ImageEntry::Present(image) => image.clone(),
                ImageEntry::Missing => {
                    log.warn(
                        &name,
                        format!("No image specified for service {}, skipping.", name),
                    );
                    derivation.skipped.push(skipped(&name, None, SKIP_NO_IMAGE));
                    continue;
                }
                ImageEntry::Invalid => {
                    log.warn(
                        &name,
                        format!("Invalid 'image' for service {}, skipping.", name),
                    );
                    derivation
                        .skipped
                        .push(skipped(&name, None, SKIP_INVALID_IMAGE));
                    continue;
                }
            };

            derivation.claims.push(ImageClaim {
                service: name.clone(),
                image: image.clone(),
            });

            let build = match definition.build {
                BuildSection::Present(build) => build,
                BuildSection::Missing => {
                    log.warn(
                        &name,
                        format!("No 'build' section for service {}, skipping.", name),
                    );
                    derivation
                        .skipped
                        .push(skipped(&name, Some(&image), SKIP_NO_BUILD));
                    continue;
                }
                BuildSection::Invalid => {
                    log.warn(
                        &name,
                        format!("Invalid 'build' section for service {}, skipping.", name),
                    );
                    derivation
                        .skipped
                        .push(skipped(&name, Some(&image), SKIP_INVALID_BUILD));
                    continue;
                }
            };

            let mirrors = self.collect_mirrors(&name, &definition.mirrors, log);
            let task = self.build_task(name, image, build, mirrors)?;
            debug!(service = %task.service, image = %task.image, "Derived build task");
            derivation.tasks.push(task);
        }

        log.run_info(format!(
            "Derived {} build task(s), {} service(s) skipped",
            derivation.tasks.len(),
            derivation.skipped.len()
        ));
        Ok(derivation)
    }

    fn build_task(
        &self,
        service: String,
        image: String,
        build: BuildConfig,
        mirrors: Vec<String>,
    ) -> Result<BuildTask> {
        let context = resolve_context(&self.base_dir, &build.context)?;
        let build_args = build
            .args
            .into_iter()
            .map(|(key, default)| {
                let value = self.env.get(&key).map(str::to_string).unwrap_or(default);
                (key, value)
            })
            .collect();

        Ok(BuildTask {
            service,
            context,
            dockerfile: build.dockerfile,
            image,
            build_args,
            mirrors,
            config: Arc::clone(&self.config),
        })
    }

    fn collect_mirrors(&self, service: &str, entries: &[Value], log: &LogHandle) -> Vec<String> {
        entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(mirror) if !mirror.is_empty() => Some(mirror.clone()),
                other => {
                    log.warn(
                        service,
                        format!("Ignoring invalid mirror entry: {}", scalar_to_string(other)),
                    );
                    None
                }
            })
            .collect()
    }
}

fn skipped(service: &str, image: Option<&str>, reason: &str) -> SkippedService {
    SkippedService {
        service: service.to_string(),
        image: image.map(str::to_string),
        reason: reason.to_string(),
    }
}

/// ビルドコンテキストを絶対パスに解決する（相対パスはマニフェストのディレクトリ基準）
fn resolve_context(base_dir: &Path, context: &str) -> Result<PathBuf> {
    let joined = base_dir.join(context);
    std::path::absolute(&joined).map_err(|e| ComposeError::Io {
        path: joined,
        message: e.to_string(),
    })
}

/// マニフェスト全体からタスクを導出する
pub fn derive_tasks(
    manifest: &Manifest,
    config: Arc<RunConfig>,
    env: &EnvVars,
    log: &LogHandle,
) -> Result<Derivation> {
    TaskDeriver::new(config, env, manifest.base_dir()).derive(manifest.document(), log)
}
