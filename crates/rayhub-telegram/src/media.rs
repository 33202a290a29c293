// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media uploads routed to the Bot API method matching the file type.

use rayhub_core::error::RayhubError;
use rayhub_core::types::{MediaKind, OutboundMedia};
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use tracing::debug;

use crate::api_error;

fn input_file(media: &OutboundMedia) -> InputFile {
    let name = if media.filename.is_empty() {
        "file".to_string()
    } else {
        media.filename.clone()
    };
    InputFile::memory(media.data.clone()).file_name(name)
}

/// Uploads one file. The caption, when present, is sent as Telegram HTML.
pub async fn send_media(bot: &Bot, chat_id: ChatId, media: OutboundMedia) -> Result<(), RayhubError> {
    let file = input_file(&media);
    let caption = media.caption.clone().filter(|c| !c.is_empty());

    debug!(
        chat_id = chat_id.0,
        kind = %media.kind,
        filename = %media.filename,
        size = media.data.len(),
        "uploading media to Telegram"
    );

    macro_rules! upload {
        ($method:ident, $op:literal) => {{
            let mut req = bot.$method(chat_id, file);
            if let Some(caption) = caption {
                req = req.caption(caption).parse_mode(ParseMode::Html);
            }
            req.await.map(|_| ()).map_err(|e| api_error($op, e))
        }};
    }

    match media.kind {
        MediaKind::Photo => upload!(send_photo, "sendPhoto"),
        MediaKind::Video => upload!(send_video, "sendVideo"),
        MediaKind::Voice => upload!(send_voice, "sendVoice"),
        MediaKind::Audio => upload!(send_audio, "sendAudio"),
        MediaKind::Document => upload!(send_document, "sendDocument"),
    }
}
