//! ディレクトリ内のロケールファイル (`<locale>.json`) を読み書きするストア

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};
use ignore::WalkBuilder;

use super::{
    LocaleStore,
    StoreError,
    StoreOutput,
    locale_file_name,
    render_document,
};
use crate::document::{
    Document,
    LocaleDocuments,
    parse_document,
};

/// Locale files stored as `<locales_path>/<locale>.json`.
#[derive(Debug)]
pub struct FileSystemStore {
    /// ソースドキュメントのパス
    source_path: PathBuf,
    /// ロケールファイルのディレクトリ
    locales_path: PathBuf,
    /// ロケールファイルとして扱わないファイル名
    excluded: GlobSet,
}

impl FileSystemStore {
    /// Store over `locales_path`, skipping files matched by `excluded_files`.
    ///
    /// # Errors
    /// - 除外パターンが不正
    pub fn new(
        source_path: PathBuf,
        locales_path: PathBuf,
        excluded_files: &[String],
    ) -> Result<Self, StoreError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in excluded_files {
            let glob = Glob::new(pattern).map_err(|source| StoreError::InvalidExclude {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let excluded = builder.build().map_err(|source| StoreError::InvalidExclude {
            pattern: excluded_files.join(", "),
            source,
        })?;

        Ok(Self { source_path, locales_path, excluded })
    }

    /// `path` の I/O エラーを `StoreError` に変換する
    fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |source| StoreError::Io { path: path.to_path_buf(), source }
    }

    /// ロケールディレクトリ直下の `*.json` ファイルを列挙 (除外ファイルを除く)
    fn locale_files(&self) -> Vec<(String, PathBuf)> {
        let mut files = Vec::new();

        for result in WalkBuilder::new(&self.locales_path)
            .max_depth(Some(1))
            .standard_filters(false)
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            // ファイルのみを対象
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let Some(file_name) = path.file_name() else {
                continue;
            };
            if self.excluded.is_match(file_name) {
                tracing::debug!(?path, "Skipping excluded file");
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            files.push((stem.to_string(), path.to_path_buf()));
        }

        files
    }

    /// ロケールファイルを 1 つ読み込む
    fn read_locale(name: &str, path: &Path) -> Result<Document, StoreError> {
        let content = std::fs::read_to_string(path).map_err(Self::io_error(path))?;
        parse_document(&content)
            .map_err(|source| StoreError::Document { name: name.to_string(), source })
    }

    /// `<locale>.json.tmp` に書き込む
    fn stage(path: &Path, document: &Document) -> Result<PathBuf, StoreError> {
        let temp_path = path.with_extension("json.tmp");
        let content = render_document(document)?;
        std::fs::write(&temp_path, content).map_err(Self::io_error(&temp_path))?;
        Ok(temp_path)
    }

    /// Best-effort removal of temp files left by a failed commit.
    fn discard(staged: &[(PathBuf, PathBuf)]) {
        for (temp_path, _) in staged {
            if let Err(err) = std::fs::remove_file(temp_path) {
                tracing::debug!(?temp_path, ?err, "Failed to remove temp file");
            }
        }
    }
}

impl LocaleStore for FileSystemStore {
    fn source_document(&self) -> Result<Document, StoreError> {
        let content =
            std::fs::read_to_string(&self.source_path).map_err(Self::io_error(&self.source_path))?;
        if content.trim().is_empty() {
            return Err(StoreError::EmptySource(self.source_path.clone()));
        }
        parse_document(&content).map_err(|source| StoreError::Document {
            name: self.source_path.display().to_string(),
            source,
        })
    }

    fn previous_locales(&self) -> Result<Option<LocaleDocuments>, StoreError> {
        if !self.locales_path.is_dir() {
            tracing::debug!(path = ?self.locales_path, "Creating locales directory");
            std::fs::create_dir_all(&self.locales_path)
                .map_err(Self::io_error(&self.locales_path))?;
            return Ok(None);
        }

        let mut locales = LocaleDocuments::new();
        for (name, path) in self.locale_files() {
            let document = Self::read_locale(&name, &path)?;
            locales.insert(name, document);
        }

        if locales.is_empty() {
            tracing::debug!(path = ?self.locales_path, "No locale files found");
            return Ok(None);
        }
        Ok(Some(locales))
    }

    fn remove_locale(
        &mut self,
        locale: &str,
        output: &mut LocaleDocuments,
    ) -> Result<(), StoreError> {
        output.remove(locale);

        let path = self.locales_path.join(locale_file_name(locale));
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(?path, "Removed locale file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn output_locales(
        &mut self,
        output: &LocaleDocuments,
        source_locale: &str,
    ) -> Result<StoreOutput, StoreError> {
        std::fs::create_dir_all(&self.locales_path).map_err(Self::io_error(&self.locales_path))?;

        // ソースロケールは最後にコミットする
        let ordered = output
            .iter()
            .filter(|(locale, _)| locale.as_str() != source_locale)
            .chain(output.get_key_value(source_locale));

        // すべての一時ファイルの書き込みが成功するまでリネームしない
        let mut staged = Vec::with_capacity(output.len());
        for (locale, document) in ordered {
            let path = self.locales_path.join(locale_file_name(locale));
            match Self::stage(&path, document) {
                Ok(temp_path) => staged.push((temp_path, path)),
                Err(err) => {
                    Self::discard(&staged);
                    return Err(err);
                }
            }
        }

        for (index, (temp_path, path)) in staged.iter().enumerate() {
            if let Err(source) = std::fs::rename(temp_path, path) {
                Self::discard(staged.get(index..).unwrap_or_default());
                return Err(StoreError::Io { path: path.clone(), source });
            }
        }

        tracing::debug!(files = staged.len(), "Wrote locale files");
        Ok(StoreOutput::Files(staged.into_iter().map(|(_, path)| path).collect()))
    }
}
