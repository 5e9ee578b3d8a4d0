//! Runs a real `stitch` receiver on 127.0.0.1:0 in a background runtime.

use std::path::Path;
use std::thread::JoinHandle;

use stitch_core::server;
use stitch_core::store::Receiver;
use tempfile::TempDir;
use tokio::sync::oneshot;

pub struct TestReceiver {
    pub url: String,
    pub receiver: Receiver,
    root: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl TestReceiver {
    pub fn start(max_chunk_bytes: u64) -> Self {
        let root = tempfile::tempdir().unwrap();
        let receiver = Receiver::new(root.path(), max_chunk_bytes);
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.set_nonblocking(true).unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = oneshot::channel::<()>();

        let served = receiver.clone();
        let thread = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                server::serve(listener, served, async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
            });
        });

        Self {
            url: format!("http://127.0.0.1:{port}"),
            receiver,
            root,
            shutdown: Some(tx),
            thread: Some(thread),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }
}

impl Drop for TestReceiver {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
