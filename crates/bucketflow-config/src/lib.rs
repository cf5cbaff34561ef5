pub mod error;

pub use error::*;

use std::path::PathBuf;

/// バケット定義ファイルを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "BUCKETFLOW_CONFIG_PATH";

/// フラグにも環境変数にも指定がない場合のリージョン
pub const DEFAULT_REGION: &str = "us-east-1";

const REGION_ENV_VARS: [&str; 2] = ["AWS_REGION", "AWS_DEFAULT_REGION"];

/// プロジェクトのbucket.kdlファイルを探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 `BUCKETFLOW_CONFIG_PATH` (直接パス指定)
/// 2. カレントディレクトリ: bucket.local.kdl, .bucket.local.kdl, bucket.kdl, .bucket.kdl
/// 3. `./.bucketflow/` ディレクトリ内: 同様の順序
/// 4. `~/.config/bucketflow/bucket.kdl` (グローバル設定)
pub fn find_bucket_file() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;
    let candidates = [
        "bucket.local.kdl",
        ".bucket.local.kdl",
        "bucket.kdl",
        ".bucket.kdl",
    ];

    // 2. カレントディレクトリで検索
    for filename in &candidates {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    // 3. ./.bucketflow/ ディレクトリで検索
    let project_dir = current_dir.join(".bucketflow");
    if project_dir.is_dir() {
        for filename in &candidates {
            let path = project_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    // 4. グローバル設定ファイル
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("bucketflow").join("bucket.kdl");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::BucketFileNotFound)
}

/// AWSリージョンを決定する
///
/// 明示指定、`AWS_REGION`、`AWS_DEFAULT_REGION`、[`DEFAULT_REGION`] の順。
/// 空文字の値は無視する。
pub fn resolve_region(explicit: Option<&str>) -> String {
    if let Some(region) = explicit.map(str::trim).filter(|r| !r.is_empty()) {
        return region.to_string();
    }

    REGION_ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}
