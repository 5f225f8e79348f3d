use http::StatusCode;
use opendal_common::{Error, ErrorKind};
use reqwest::Response;
use serde::Deserialize;

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
struct IpfsError {
    #[serde(rename = "Message")]
    message: String,
    #[serde(rename = "Code")]
    code: i64,
    #[serde(rename = "Type")]
    ty: String,
}

/// Turn a failed Kubo RPC response into an [`Error`].
///
/// Kubo answers 500 for every command failure and puts the reason into a
/// JSON body, e.g. `{"Message": "file does not exist", "Code": 0, "Type": "error"}`.
pub(super) async fn parse_error(resp: Response) -> Error {
    let status = resp.status();
    let bs = match resp.bytes().await {
        Ok(bs) => bs,
        Err(err) => return parse_reqwest_error(err),
    };

    let ipfs_error = serde_json::from_slice::<IpfsError>(&bs).ok();

    let (kind, retryable) = match status {
        StatusCode::INTERNAL_SERVER_ERROR => match &ipfs_error {
            Some(ie) if ie.message == "file does not exist" => (ErrorKind::ObjectNotFound, false),
            _ => (ErrorKind::Unexpected, false),
        },
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            (ErrorKind::Unexpected, true)
        }
        _ => (ErrorKind::Unexpected, false),
    };

    let message = match &ipfs_error {
        Some(ie) => format!("{} (code: {}, type: {})", ie.message, ie.code, ie.ty),
        None => String::from_utf8_lossy(&bs).into_owned(),
    };

    let err = Error::new(kind, &message).with_context("response", format!("status: {status}"));
    if retryable { err.set_temporary() } else { err }
}

/// Errors raised before a response arrives.
pub(super) fn parse_reqwest_error(err: reqwest::Error) -> Error {
    let temporary = err.is_timeout() || err.is_connect() || err.is_request();

    let e = Error::new(ErrorKind::Unexpected, "send request to ipfs").set_source(err);
    if temporary { e.set_temporary() } else { e }
}

pub(super) fn parse_json_error(err: serde_json::Error) -> Error {
    Error::new(ErrorKind::Unexpected, "deserialize json from ipfs").set_source(err)
}
