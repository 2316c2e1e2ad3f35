use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info_span, Instrument};

use crate::{
    application::{context::RequestContext, error::ApplicationError, use_cases::file_use_case::FileUseCase},
    domain::models::file::{AccessPolicy, BatchDeleteRequest, DeleteRequest, FileUpload},
    proto::{
        file_storage_server::FileStorage, upload_request::Data, BatchDeleteRequest as BatchDeleteMessage,
        DeleteRequest as DeleteMessage, MetaData, UploadRequest, UploadResponse,
    },
};

/// gRPC front of the file use case.
pub struct FileStorageController {
    file_use_case: Arc<dyn FileUseCase>,
}

impl FileStorageController {
    pub fn new(file_use_case: Arc<dyn FileUseCase>) -> Self {
        Self { file_use_case }
    }

    /// Builds the request context, honouring the caller's `grpc-timeout`.
    fn extract_context<T>(request: &Request<T>) -> RequestContext {
        let ctx = RequestContext::new();
        match request
            .metadata()
            .get("grpc-timeout")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_grpc_timeout)
        {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }
}

#[tonic::async_trait]
impl FileStorage for FileStorageController {
    async fn upload(
        &self,
        request: Request<Streaming<UploadRequest>>,
    ) -> Result<Response<UploadResponse>, Status> {
        let ctx = Self::extract_context(&request);
        let span = info_span!("upload", request_id = %ctx.request_id());

        async move {
            let file = reassemble_upload(request.into_inner()).await?;
            let result = self.file_use_case.upload(&ctx, file).await?;
            Ok::<_, Status>(Response::new(UploadResponse {
                url: result.location_url,
            }))
        }
        .instrument(span)
        .await
    }

    async fn delete(&self, request: Request<DeleteMessage>) -> Result<Response<()>, Status> {
        let ctx = Self::extract_context(&request);
        let span = info_span!("delete", request_id = %ctx.request_id());
        let url = request.into_inner().url;

        self.file_use_case
            .delete(&ctx, DeleteRequest::new(url))
            .instrument(span)
            .await?;
        Ok(Response::new(()))
    }

    async fn batch_delete(
        &self,
        request: Request<BatchDeleteMessage>,
    ) -> Result<Response<()>, Status> {
        let ctx = Self::extract_context(&request);
        let span = info_span!("batch_delete", request_id = %ctx.request_id());
        let batch: BatchDeleteRequest = request.into_inner().urls.into_iter().collect();

        self.file_use_case
            .batch_delete(&ctx, batch)
            .instrument(span)
            .await?;
        Ok(Response::new(()))
    }
}

enum UploadState {
    AwaitingMetadata,
    AwaitingChunks { metadata: MetaData, content: Vec<u8> },
}

/// Folds an upload stream into a single file: one metadata message followed
/// by any number of content chunks. Read errors surface as `Unknown`; out of
/// order messages as `InvalidArgument`.
pub(crate) async fn reassemble_upload<S>(mut stream: S) -> Result<FileUpload, Status>
where
    S: Stream<Item = Result<UploadRequest, Status>> + Unpin,
{
    let mut state = UploadState::AwaitingMetadata;

    while let Some(message) = stream.next().await {
        let message =
            message.map_err(|e| Status::unknown(format!("failed to read upload stream: {}", e.message())))?;

        state = match (state, message.data) {
            (UploadState::AwaitingMetadata, Some(Data::Metadata(metadata))) => {
                debug!(
                    "Receiving {} into directory '{}'",
                    metadata.filename, metadata.directory
                );
                UploadState::AwaitingChunks {
                    metadata,
                    content: Vec::new(),
                }
            }
            (UploadState::AwaitingMetadata, _) => {
                return Err(protocol_error("first message must carry file metadata"));
            }
            (UploadState::AwaitingChunks { metadata, mut content }, Some(Data::Content(chunk))) => {
                debug!("Received chunk of {} bytes", chunk.len());
                content.extend_from_slice(&chunk);
                UploadState::AwaitingChunks { metadata, content }
            }
            (UploadState::AwaitingChunks { .. }, Some(Data::Metadata(_))) => {
                return Err(protocol_error("metadata may only be sent once"));
            }
            (UploadState::AwaitingChunks { .. }, None) => {
                return Err(protocol_error("message carries neither metadata nor content"));
            }
        };
    }

    match state {
        UploadState::AwaitingMetadata => Err(protocol_error("upload stream ended before metadata")),
        UploadState::AwaitingChunks { metadata, content } => Ok(FileUpload::new(
            content,
            metadata.directory,
            metadata.filename,
            AccessPolicy::PublicRead.as_str(),
        )),
    }
}

fn protocol_error(message: &str) -> Status {
    ApplicationError::Protocol(message.to_string()).into()
}

/// Parses a `grpc-timeout` header value: up to eight digits and a unit.
fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 || value.len() > 9 {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    let amount: u64 = digits.parse().ok()?;
    match unit {
        "H" => Some(Duration::from_secs(amount * 60 * 60)),
        "M" => Some(Duration::from_secs(amount * 60)),
        "S" => Some(Duration::from_secs(amount)),
        "m" => Some(Duration::from_millis(amount)),
        "u" => Some(Duration::from_micros(amount)),
        "n" => Some(Duration::from_nanos(amount)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::{transport::Server, Code};
    use tonic_types::StatusExt;

    use super::*;
    use crate::{
        application::use_cases::file_use_case::MockFileUseCase,
        domain::models::file::UploadResult,
        proto::{file_storage_client::FileStorageClient, file_storage_server::FileStorageServer},
    };

    fn metadata(directory: &str, filename: &str) -> UploadRequest {
        UploadRequest {
            data: Some(Data::Metadata(MetaData {
                directory: directory.to_string(),
                filename: filename.to_string(),
            })),
        }
    }

    fn chunk(bytes: &[u8]) -> UploadRequest {
        UploadRequest {
            data: Some(Data::Content(bytes.to_vec())),
        }
    }

    fn stream(
        messages: Vec<Result<UploadRequest, Status>>,
    ) -> impl Stream<Item = Result<UploadRequest, Status>> + Unpin {
        tokio_stream::iter(messages)
    }

    #[tokio::test]
    async fn chunks_are_concatenated_in_order() {
        let file = reassemble_upload(stream(vec![
            Ok(metadata("test", "1mb.jpg")),
            Ok(chunk(b"ab")),
            Ok(chunk(b"")),
            Ok(chunk(b"cd")),
        ]))
        .await
        .unwrap();

        assert_eq!(file.content.as_deref(), Some(&b"abcd"[..]));
        assert_eq!(file.object_key(), "test/1mb.jpg");
        assert_eq!(file.access_policy, "public-read");
    }

    #[tokio::test]
    async fn metadata_only_is_an_empty_file() {
        let file = reassemble_upload(stream(vec![Ok(metadata("", "empty.txt"))]))
            .await
            .unwrap();
        assert_eq!(file.content, Some(vec![]));
    }

    #[tokio::test]
    async fn content_before_metadata_is_rejected() {
        let status = reassemble_upload(stream(vec![Ok(chunk(b"ab")), Ok(metadata("a", "b"))]))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn empty_stream_is_rejected() {
        let status = reassemble_upload(stream(vec![])).await.unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn second_metadata_is_rejected() {
        let status = reassemble_upload(stream(vec![
            Ok(metadata("a", "b.txt")),
            Ok(chunk(b"x")),
            Ok(metadata("a", "c.txt")),
        ]))
        .await
        .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let status = reassemble_upload(stream(vec![Ok(UploadRequest { data: None })]))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn read_error_is_unknown() {
        let status = reassemble_upload(stream(vec![
            Ok(metadata("a", "b.txt")),
            Err(Status::aborted("connection reset")),
        ]))
        .await
        .unwrap_err();
        assert_eq!(status.code(), Code::Unknown);
    }

    #[test]
    fn grpc_timeout_units() {
        assert_eq!(parse_grpc_timeout("100m"), Some(Duration::from_millis(100)));
        assert_eq!(parse_grpc_timeout("2S"), Some(Duration::from_secs(2)));
        assert_eq!(parse_grpc_timeout("1H"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_grpc_timeout("5x"), None);
        assert_eq!(parse_grpc_timeout("m"), None);
        assert_eq!(parse_grpc_timeout("123456789S"), None);
    }

    async fn serve(use_case: MockFileUseCase) -> (SocketAddr, oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let controller = FileStorageController::new(Arc::new(use_case));

        tokio::spawn(async move {
            Server::builder()
                .add_service(FileStorageServer::new(controller))
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });

        (addr, tx)
    }

    #[tokio::test]
    async fn upload_round_trip() {
        let mut use_case = MockFileUseCase::new();
        use_case
            .expect_upload()
            .withf(|_, file| {
                file.object_key() == "test/1mb.jpg" && file.content.as_deref() == Some(&b"chunk1chunk2"[..])
            })
            .times(1)
            .returning(|_, _| {
                Ok(UploadResult {
                    location_url: "https://host/mybucket/test/1mb.jpg".to_string(),
                })
            });

        let (addr, shutdown) = serve(use_case).await;
        let mut client = FileStorageClient::connect(format!("http://{}", addr)).await.unwrap();

        let messages = vec![metadata("test", "1mb.jpg"), chunk(b"chunk1"), chunk(b"chunk2")];
        let response = client.upload(tokio_stream::iter(messages)).await.unwrap();
        assert_eq!(response.into_inner().url, "https://host/mybucket/test/1mb.jpg");

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn batch_delete_reports_offending_element() {
        let mut use_case = MockFileUseCase::new();
        use_case
            .expect_batch_delete()
            .times(1)
            .returning(|_, _| Err(ApplicationError::invalid_url("urls[1]", "https://host/other/b.jpg")));

        let (addr, shutdown) = serve(use_case).await;
        let mut client = FileStorageClient::connect(format!("http://{}", addr)).await.unwrap();

        let status = client
            .batch_delete(BatchDeleteMessage {
                urls: vec![
                    "https://host/mybucket/a.jpg".to_string(),
                    "https://host/other/b.jpg".to_string(),
                ],
            })
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
        let bad_request = status.get_details_bad_request().unwrap();
        assert_eq!(bad_request.field_violations[0].field, "urls[1]");

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn delete_passes_url_through() {
        let mut use_case = MockFileUseCase::new();
        use_case
            .expect_delete()
            .withf(|_, request| request.url == "https://host/mybucket/a/b.jpg")
            .times(1)
            .returning(|_, _| Ok(()));

        let (addr, shutdown) = serve(use_case).await;
        let mut client = FileStorageClient::connect(format!("http://{}", addr)).await.unwrap();

        client
            .delete(DeleteMessage {
                url: "https://host/mybucket/a/b.jpg".to_string(),
            })
            .await
            .unwrap();

        let _ = shutdown.send(());
    }
}
