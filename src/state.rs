use crate::models::AppData;
use std::{num::NonZeroUsize, path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub rolling_window: NonZeroUsize,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: AppData, rolling_window: NonZeroUsize) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            rolling_window,
        }
    }
}
