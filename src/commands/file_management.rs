use crate::dashcam::YiDashcam;
use crate::error::Result;
use crate::file::{FileCategory, FileRecord, FileRef, parse_file_list};
use crate::protocol::{Command, CommandRequest, Mode};
use crate::transport::ByteStream;
use async_trait::async_trait;

#[async_trait]
pub trait FileManagement: Send + Sync {
    /// List files on the dashcam SD card, in the order the dashcam reports them
    async fn file_list(&self) -> Result<Vec<FileRecord>>;

    /// List files of one category
    async fn category_list(&self, category: FileCategory) -> Result<Vec<FileRecord>>;

    /// Newest photo on the card
    async fn latest_photo(&self) -> Result<Option<FileRecord>>;

    /// Stream the thumbnail of a file
    async fn thumbnail(&self, file: FileRef<'_>) -> Result<ByteStream>;

    /// Stream a file from the SD card
    async fn file(&self, file: FileRef<'_>) -> Result<ByteStream>;

    /// Delete a file. `force` also removes protected files such as emergency clips
    async fn delete_file(&self, file: FileRef<'_>, force: bool) -> Result<()>;
}

#[async_trait]
impl FileManagement for YiDashcam {
    async fn file_list(&self) -> Result<Vec<FileRecord>> {
        self.require_connected().await?;
        if self.current_mode().await == Some(Mode::File) {
            if let Some(files) = self.files.get().await {
                return Ok(files);
            }
        } else {
            self.ensure_mode(Mode::File).await?;
        }

        // Read after the mode switch, which bumps the generation itself.
        let generation = self.files.generation().await;
        log::debug!("Fetching file list from dash cam");
        let body = self
            .send_command(CommandRequest::new(Command::FileList))
            .await?
            .into_document()?;
        let files = parse_file_list(&body)?;
        self.files.store(generation, files.clone()).await;
        Ok(files)
    }

    async fn category_list(&self, category: FileCategory) -> Result<Vec<FileRecord>> {
        Ok(category.filter(&self.file_list().await?))
    }

    async fn latest_photo(&self) -> Result<Option<FileRecord>> {
        Ok(self
            .category_list(FileCategory::Photo)
            .await?
            .into_iter()
            .max())
    }

    async fn thumbnail(&self, file: FileRef<'_>) -> Result<ByteStream> {
        let request = CommandRequest::new(Command::FileThumbnail).with_path(file.url_path());
        self.open_stream(request).await
    }

    async fn file(&self, file: FileRef<'_>) -> Result<ByteStream> {
        let request = CommandRequest::new(Command::FileGet).with_path(file.url_path());
        self.open_stream(request).await
    }

    async fn delete_file(&self, file: FileRef<'_>, force: bool) -> Result<()> {
        let command = if force {
            Command::FileForceDelete
        } else {
            Command::FileDelete
        };
        let result = self
            .send_command(CommandRequest::new(command).with_str(file.device_path()))
            .await;
        self.files.invalidate().await;
        result.map(|_| ())
    }
}
