//! # UploadSession Entity
//!
//! 再開可能アップロードセッションと、チャンクのバイト範囲

use crate::domain::errors::UploaderError;

/// これ未満のファイルはセッションを作らず単一PUTでアップロードする（4 MiB）
pub const SIMPLE_UPLOAD_LIMIT: u64 = 4 * 1024 * 1024;

/// デフォルトのチャンクサイズ（10 MiB）
pub const DEFAULT_CHUNK_SIZE: u64 = 10 * 1024 * 1024;

/// チャンクサイズはこの倍数でなければならない（320 KiB）
pub const CHUNK_ALIGNMENT: u64 = 320 * 1024;

/// チャンクのバイト範囲（終端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    /// 先頭オフセット
    pub start: u64,
    /// 末尾オフセット（含む）
    pub end: u64,
    /// ファイル全体のサイズ
    pub total: u64,
}

impl ChunkRange {
    /// チャンクの長さ
    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` ヘッダーの値
    ///
    /// ```
    /// use onedrive_uploader::domain::entities::upload_session::ChunkRange;
    ///
    /// let range = ChunkRange { start: 0, end: 10485759, total: 26214400 };
    /// assert_eq!(range.content_range(), "bytes 0-10485759/26214400");
    /// ```
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

/// アップロードセッション
///
/// ファイル1つ分の転送状態。`bytes_sent` は単調増加し、
/// 常に `0 <= bytes_sent <= total_size` を満たす。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    session_url: String,
    total_size: u64,
    bytes_sent: u64,
}

impl UploadSession {
    /// 新しいセッションを作成
    ///
    /// # Arguments
    ///
    /// * `session_url` - バックエンドが払い出したアップロードURL
    /// * `total_size` - 転送するファイルのサイズ
    pub fn new(session_url: impl Into<String>, total_size: u64) -> Self {
        Self {
            session_url: session_url.into(),
            total_size,
            bytes_sent: 0,
        }
    }

    pub fn session_url(&self) -> &str {
        &self.session_url
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// 全バイトを送信済みかどうか
    pub fn is_complete(&self) -> bool {
        self.bytes_sent == self.total_size
    }

    /// 次に送るチャンクの範囲
    ///
    /// 送信完了済み、または `chunk_size` が0の場合は `None`
    pub fn next_range(&self, chunk_size: u64) -> Option<ChunkRange> {
        if self.is_complete() || chunk_size == 0 {
            return None;
        }

        let len = chunk_size.min(self.total_size - self.bytes_sent);
        Some(ChunkRange {
            start: self.bytes_sent,
            end: self.bytes_sent + len - 1,
            total: self.total_size,
        })
    }

    /// 確認応答を受けたチャンクの分だけオフセットを進める
    ///
    /// # Errors
    ///
    /// 進めた結果が `total_size` を超える場合
    pub fn advance(&mut self, len: u64) -> Result<u64, UploaderError> {
        let next = self
            .bytes_sent
            .checked_add(len)
            .filter(|next| *next <= self.total_size)
            .ok_or_else(|| {
                UploaderError::InvalidResponse(format!(
                    "chunk of {} bytes overruns session ({}/{} bytes sent)",
                    len, self.bytes_sent, self.total_size
                ))
            })?;

        self.bytes_sent = next;
        Ok(next)
    }

    /// 進捗率（%）
    pub fn percent(&self) -> f64 {
        progress_percent(self.bytes_sent, self.total_size)
    }
}

/// 進捗率（%）を計算する。サイズ0は完了扱い
pub fn progress_percent(bytes_sent: u64, total_size: u64) -> f64 {
    if total_size == 0 {
        return 100.0;
    }
    bytes_sent as f64 / total_size as f64 * 100.0
}

/// アップロード方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStrategy {
    /// 単一PUTによるコンテンツ置換
    Simple,
    /// アップロードセッションを使ったチャンク転送
    Chunked { chunk_count: u64 },
}

impl UploadStrategy {
    /// ファイルサイズからアップロード方式を決める
    pub fn choose(total_size: u64, simple_limit: u64, chunk_size: u64) -> Self {
        if total_size < simple_limit || chunk_size == 0 {
            Self::Simple
        } else {
            Self::Chunked {
                chunk_count: total_size.div_ceil(chunk_size),
            }
        }
    }
}

/// チャンク転送で送る範囲の一覧
pub fn plan_chunks(total_size: u64, chunk_size: u64) -> Vec<ChunkRange> {
    let mut session = UploadSession::new(String::new(), total_size);
    let mut ranges = Vec::new();

    while let Some(range) = session.next_range(chunk_size) {
        ranges.push(range);
        // next_range は残りサイズ以内の範囲しか返さない
        session.bytes_sent += range.len();
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn test_plan_25_mib_with_10_mib_chunks() {
        let ranges = plan_chunks(25 * MIB, 10 * MIB);

        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0].content_range(), "bytes 0-10485759/26214400");
        assert_eq!(ranges[1].content_range(), "bytes 10485760-20971519/26214400");
        assert_eq!(ranges[2].content_range(), "bytes 20971520-26214399/26214400");
        assert_eq!(ranges[2].len(), 5 * MIB);
    }

    #[test]
    fn test_plan_evenly_divisible() {
        let ranges = plan_chunks(20 * MIB, 10 * MIB);

        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].len(), 10 * MIB);
        assert_eq!(ranges[1].end, 20 * MIB - 1);
    }

    #[test]
    fn test_plan_covers_every_byte() {
        let total = 7 * MIB + 123;
        let ranges = plan_chunks(total, 3 * MIB);

        let sum: u64 = ranges.iter().map(ChunkRange::len).sum();
        assert_eq!(sum, total);
        assert_eq!(ranges.len() as u64, total.div_ceil(3 * MIB));
        assert_eq!(ranges.last().unwrap().end, total - 1);

        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end + 1, pair[1].start);
        }
    }

    #[test]
    fn test_session_advance() {
        let mut session = UploadSession::new("https://upload.example/s1", 100);
        assert_eq!(session.session_url(), "https://upload.example/s1");
        assert_eq!(session.bytes_sent(), 0);
        assert!(!session.is_complete());

        let range = session.next_range(60).unwrap();
        assert_eq!((range.start, range.end, range.total), (0, 59, 100));
        assert_eq!(session.advance(range.len()).unwrap(), 60);

        let range = session.next_range(60).unwrap();
        assert_eq!((range.start, range.end), (60, 99));
        assert_eq!(session.advance(range.len()).unwrap(), 100);

        assert!(session.is_complete());
        assert!(session.next_range(60).is_none());
        assert_eq!(session.percent(), 100.0);
    }

    #[test]
    fn test_session_rejects_overrun() {
        let mut session = UploadSession::new("url", 10);
        session.advance(8).unwrap();

        let result = session.advance(3);
        assert!(matches!(result, Err(UploaderError::InvalidResponse(_))));
        assert_eq!(session.bytes_sent(), 8);
    }

    #[test]
    fn test_zero_chunk_size_yields_nothing() {
        let session = UploadSession::new("url", 10);
        assert!(session.next_range(0).is_none());
        assert!(plan_chunks(10, 0).is_empty());
    }

    #[test]
    fn test_strategy_threshold() {
        assert_eq!(
            UploadStrategy::choose(SIMPLE_UPLOAD_LIMIT - 1, SIMPLE_UPLOAD_LIMIT, DEFAULT_CHUNK_SIZE),
            UploadStrategy::Simple
        );
        assert_eq!(
            UploadStrategy::choose(0, SIMPLE_UPLOAD_LIMIT, DEFAULT_CHUNK_SIZE),
            UploadStrategy::Simple
        );
        assert_eq!(
            UploadStrategy::choose(SIMPLE_UPLOAD_LIMIT, SIMPLE_UPLOAD_LIMIT, DEFAULT_CHUNK_SIZE),
            UploadStrategy::Chunked { chunk_count: 1 }
        );
        assert_eq!(
            UploadStrategy::choose(25 * MIB, SIMPLE_UPLOAD_LIMIT, DEFAULT_CHUNK_SIZE),
            UploadStrategy::Chunked { chunk_count: 3 }
        );
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 0), 100.0);
        assert_eq!(progress_percent(50, 200), 25.0);
    }

    #[test]
    fn test_default_chunk_size_is_aligned() {
        assert_eq!(DEFAULT_CHUNK_SIZE % CHUNK_ALIGNMENT, 0);
    }
}
