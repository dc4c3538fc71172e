use tokio::sync::mpsc::UnboundedSender;

use crate::interactive::{ChannelKind, UpdateEvent, UpdateObserver, WarningButtonState};
use crate::model::ProgressState;

/// セッション内部イベント
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// 標準入力からの更新
    Update(UpdateEvent),
    /// タイムアウト到達
    TimeoutFired { generation: u64 },
    /// リマインダー到達
    ReminderFired { generation: u64 },
    /// カウントダウン（1秒ごと）
    CountdownTick { generation: u64, remaining_secs: u64 },
    /// Ctrl-C
    Interrupt,
}

/// 更新チャネルの状態をセッションへ転送するオブザーバー
pub struct EventForwarder {
    channel: ChannelKind,
    tx: UnboundedSender<SessionEvent>,
}

impl EventForwarder {
    pub fn new(channel: ChannelKind, tx: UnboundedSender<SessionEvent>) -> Self {
        Self { channel, tx }
    }

    fn forward(&self, event: UpdateEvent) {
        // 受信側が終了済みなら破棄
        if self.tx.send(SessionEvent::Update(event)).is_err() {
            tracing::debug!("Session closed, dropping {:?} update", self.channel);
        }
    }
}

impl UpdateObserver<ProgressState> for EventForwarder {
    fn did_receive_state(&mut self, state: ProgressState) {
        self.forward(UpdateEvent::Progress { state });
    }

    fn did_finish_updates(&mut self) {
        self.forward(UpdateEvent::Finished {
            channel: self.channel,
        });
    }
}

impl UpdateObserver<WarningButtonState> for EventForwarder {
    fn did_receive_state(&mut self, state: WarningButtonState) {
        self.forward(state.into());
    }

    fn did_finish_updates(&mut self) {
        self.forward(UpdateEvent::Finished {
            channel: self.channel,
        });
    }
}
