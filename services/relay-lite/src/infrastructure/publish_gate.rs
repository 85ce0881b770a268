/// 保存・配信とサブスクリプション登録の排他制御
///
/// EVENTの「保存→配信」とREQの「バックログ取得→登録→送信」を
/// リレー全体で直列化する。これによりREQ処理中に別接続から届いたイベントは、
/// バックログかライブ配信のどちらか一方だけで届き、EOSEより前に
/// ライブ配信が割り込むこともない。
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

/// 全セッションで共有するゲート（クローンは同じロックを指す）
#[derive(Debug, Clone, Default)]
pub struct PublishGate {
    lock: Arc<Mutex<()>>,
}

impl PublishGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// ゲートに入る（ガードを破棄すると解放）
    ///
    /// 待機中のタスクは到着順に通過する。
    pub async fn enter(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}
