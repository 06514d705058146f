use crate::error::ShareError;
use crate::groups::GroupId;
use crate::puppyshare::PuppyShare;
use crate::store::DirectoryEdit;
use crate::view::{group_choices, share_table};
use anyhow::Result;
use hyper::body::Buf;
use hyper::header::{
	ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
	ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue, ORIGIN,
};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

const CT_JSON: &str = "application/json";

#[derive(Deserialize)]
struct AddDirectoryRequest {
	path: String,
}

fn json_response(status: StatusCode, value: serde_json::Value) -> Response<Body> {
	Response::builder()
		.status(status)
		.header(hyper::header::CONTENT_TYPE, CT_JSON)
		.body(Body::from(value.to_string()))
		.unwrap()
}

fn bad_request(msg: impl Into<String>) -> Response<Body> {
	json_response(StatusCode::BAD_REQUEST, json!({ "error": msg.into() }))
}

fn error_status(err: &ShareError) -> StatusCode {
	match err {
		ShareError::DuplicateEntry { .. } | ShareError::ReadOnly | ShareError::EditInProgress => {
			StatusCode::CONFLICT
		}
		ShareError::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
		ShareError::UnknownGroup(_) | ShareError::InvalidPath(_) => StatusCode::BAD_REQUEST,
		ShareError::RemoteCallFailure { .. } => StatusCode::BAD_GATEWAY,
		ShareError::SessionClosed => StatusCode::SERVICE_UNAVAILABLE,
	}
}

fn error_response(err: ShareError) -> Response<Body> {
	json_response(error_status(&err), json!({ "error": err.to_string() }))
}

fn with_cors(mut resp: Response<Body>, origin: Option<&str>) -> Response<Body> {
	let origin_value: HeaderValue = origin
		.unwrap_or("*")
		.parse()
		.unwrap_or_else(|_| HeaderValue::from_static("*"));
	resp.headers_mut()
		.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin_value);
	resp.headers_mut().insert(
		ACCESS_CONTROL_ALLOW_HEADERS,
		HeaderValue::from_static("content-type"),
	);
	resp.headers_mut().insert(
		ACCESS_CONTROL_ALLOW_METHODS,
		HeaderValue::from_static("GET,POST,PUT,OPTIONS"),
	);
	resp.headers_mut().insert(
		ACCESS_CONTROL_ALLOW_CREDENTIALS,
		HeaderValue::from_static("true"),
	);
	resp
}

async fn read_json<T: DeserializeOwned>(req: Request<Body>) -> Result<T, Response<Body>> {
	let buf = hyper::body::aggregate(req.into_body())
		.await
		.map_err(|_| bad_request("failed to read body"))?;
	serde_json::from_reader(buf.reader()).map_err(|err| bad_request(format!("invalid json: {err}")))
}

async fn shares_view(share: &PuppyShare) -> Response<Body> {
	match share.snapshot().await {
		Ok(snapshot) => json_response(
			StatusCode::OK,
			json!(share_table(snapshot.mode, &snapshot.dirs, &snapshot.catalog)),
		),
		Err(err) => error_response(err),
	}
}

async fn handle_request(
	req: Request<Body>,
	share: Arc<PuppyShare>,
) -> Result<Response<Body>, Infallible> {
	let origin = req
		.headers()
		.get(ORIGIN)
		.and_then(|v| v.to_str().ok())
		.map(|v| v.to_string());
	let origin_ref = origin.as_deref();
	let path = req.uri().path().to_string();
	let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
	let method = req.method().clone();

	let response = match (&method, segments.as_slice()) {
		(&Method::OPTIONS, _) => Response::builder()
			.status(StatusCode::NO_CONTENT)
			.body(Body::empty())
			.unwrap(),
		(&Method::GET, ["health"]) => Response::new(Body::from("ok")),
		(&Method::GET, ["api", "groups"]) => match share.snapshot().await {
			Ok(snapshot) => json_response(StatusCode::OK, json!({ "groups": snapshot.catalog.entries() })),
			Err(err) => error_response(err),
		},
		(&Method::GET, ["api", "shares"]) => shares_view(&share).await,
		(&Method::POST, ["api", "shares"]) => match read_json::<AddDirectoryRequest>(req).await {
			Ok(payload) => match share.add_path(payload.path.trim()).await {
				Ok(()) => {
					let view = shares_view(&share).await;
					let (mut parts, body) = view.into_parts();
					if parts.status == StatusCode::OK {
						parts.status = StatusCode::CREATED;
					}
					Response::from_parts(parts, body)
				}
				Err(err) => error_response(err),
			},
			Err(resp) => resp,
		},
		(&Method::POST, ["api", "shares", "edit"]) => match share.begin_edit().await {
			Ok(_) => shares_view(&share).await,
			Err(err) => error_response(err),
		},
		(&Method::POST, ["api", "shares", "commit"]) => match share.commit().await {
			Ok(()) => shares_view(&share).await,
			Err(err) => error_response(err),
		},
		(&Method::POST, ["api", "shares", "toggle"]) => match share.toggle_edit().await {
			Ok(_) => shares_view(&share).await,
			Err(err) => error_response(err),
		},
		(&Method::POST, ["api", "shares", "refresh"]) => match share.refresh().await {
			Ok(_) => shares_view(&share).await,
			Err(err) => error_response(err),
		},
		(&Method::GET, ["api", "shares", index, "groups"]) => {
			let Ok(index) = index.parse::<usize>() else {
				return Ok(with_cors(bad_request("invalid index"), origin_ref));
			};
			match share.snapshot().await {
				Ok(snapshot) => match snapshot.dirs.get(index) {
					Some(dir) => json_response(
						StatusCode::OK,
						json!({ "choices": group_choices(&dir.visibility, &snapshot.catalog) }),
					),
					None => error_response(ShareError::IndexOutOfRange {
						index,
						len: snapshot.dirs.len(),
					}),
				},
				Err(err) => error_response(err),
			}
		}
		(&Method::PUT, ["api", "shares", index]) => {
			let Ok(index) = index.parse::<usize>() else {
				return Ok(with_cors(bad_request("invalid index"), origin_ref));
			};
			match read_json::<DirectoryEdit>(req).await {
				Ok(edit) => match share.update_field(index, edit).await {
					Ok(()) => shares_view(&share).await,
					Err(err) => error_response(err),
				},
				Err(resp) => resp,
			}
		}
		(&Method::POST, ["api", "shares", index, "groups", group_id]) => {
			let Ok(index) = index.parse::<usize>() else {
				return Ok(with_cors(bad_request("invalid index"), origin_ref));
			};
			match share.toggle_group(index, GroupId::from(*group_id)).await {
				Ok(()) => shares_view(&share).await,
				Err(err) => error_response(err),
			}
		}
		_ => json_response(StatusCode::NOT_FOUND, json!({ "error": "not found" })),
	};

	Ok(with_cors(response, origin_ref))
}

/// Serve the share manager over HTTP until Ctrl+C.
pub async fn serve(share: Arc<PuppyShare>, addr: SocketAddr) -> Result<()> {
	let make_svc = make_service_fn(move |_| {
		let share = Arc::clone(&share);
		async move {
			Ok::<_, Infallible>(service_fn(move |req| {
				let share = Arc::clone(&share);
				handle_request(req, share)
			}))
		}
	});

	let listener = TcpListener::bind(addr).await?;
	let std_listener = listener.into_std()?;
	let server = Server::from_tcp(std_listener)?
		.serve(make_svc)
		.with_graceful_shutdown(async {
			let _ = signal::ctrl_c().await;
		});
	log::info!("share manager HTTP API listening on {}", addr);
	server.await?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::directory::SharedDirectory;
	use crate::gateway::{MemoryGateway, SyncGateway};
	use crate::session::EditSession;
	use serde_json::Value;

	const FRIENDS: &str = "00000000000000000000000000000001";

	async fn started(gateway: Arc<MemoryGateway>) -> Arc<PuppyShare> {
		let share = PuppyShare::start(EditSession::new(gateway));
		share.initialize().await.unwrap();
		Arc::new(share)
	}

	async fn call(
		share: &Arc<PuppyShare>,
		method: Method,
		uri: &str,
		body: Option<Value>,
	) -> (StatusCode, Value) {
		let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
		let req = Request::builder()
			.method(method)
			.uri(uri)
			.body(body)
			.unwrap();
		let resp = handle_request(req, Arc::clone(share)).await.unwrap();
		let status = resp.status();
		let bytes = hyper::body::to_bytes(resp.into_body()).await.unwrap();
		let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
		(status, value)
	}

	#[tokio::test]
	async fn lists_shares_read_only() {
		let gateway = Arc::new(MemoryGateway::with_dirs(vec![SharedDirectory::new("/a")]));
		let share = started(gateway).await;
		let (status, body) = call(&share, Method::GET, "/api/shares", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["mode"], "read_only");
		assert_eq!(body["action_label"], "Edit");
		assert_eq!(body["rows"][0]["path"], "/a");
		assert_eq!(body["rows"][0]["visibility"], "All Friend nodes");
	}

	#[tokio::test]
	async fn edit_flow_commits_to_authority() {
		let gateway = Arc::new(MemoryGateway::with_dirs(vec![SharedDirectory::new("/a")]));
		let share = started(gateway.clone()).await;

		let edit = json!({ "field": "display_name", "value": "docs" });
		let (status, _) = call(&share, Method::PUT, "/api/shares/0", Some(edit.clone())).await;
		assert_eq!(status, StatusCode::CONFLICT);

		let (status, body) = call(&share, Method::POST, "/api/shares/toggle", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["action_label"], "Apply and Close");

		let (status, _) = call(&share, Method::PUT, "/api/shares/0", Some(edit)).await;
		assert_eq!(status, StatusCode::OK);
		let uri = format!("/api/shares/0/groups/{FRIENDS}");
		let (status, body) = call(&share, Method::POST, &uri, None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["rows"][0]["visibility"], "Friends");

		let (status, body) = call(&share, Method::POST, "/api/shares/commit", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["mode"], "read_only");
		assert_eq!(gateway.replace_calls(), 1);
		let persisted = gateway.persisted();
		assert_eq!(persisted[0].display_name, "docs");
		assert!(!persisted[0].visibility.is_all());
	}

	#[tokio::test]
	async fn begin_edit_and_refresh() {
		let gateway = Arc::new(MemoryGateway::with_dirs(vec![SharedDirectory::new("/a")]));
		let share = started(gateway.clone()).await;
		gateway.add_one(&SharedDirectory::new("/b")).await.unwrap();

		let (status, body) = call(&share, Method::POST, "/api/shares/refresh", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["rows"].as_array().unwrap().len(), 2);
		assert_eq!(body["rows"][1]["path"], "/b");

		let (status, body) = call(&share, Method::POST, "/api/shares/edit", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["mode"], "editing");
		assert_eq!(body["rows"][0]["editable"], true);
		let (status, body) = call(&share, Method::POST, "/api/shares/edit", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["mode"], "editing");

		let fetches = gateway.fetch_calls();
		let (status, body) = call(&share, Method::POST, "/api/shares/refresh", None).await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert!(body["error"].is_string());
		assert_eq!(gateway.fetch_calls(), fetches);
		assert_eq!(share.snapshot().await.unwrap().mode, crate::session::EditMode::Editing);
	}

	#[tokio::test]
	async fn add_and_duplicate() {
		let gateway = Arc::new(MemoryGateway::new());
		let share = started(gateway.clone()).await;
		let (status, body) = call(
			&share,
			Method::POST,
			"/api/shares",
			Some(json!({ "path": "/srv/films" })),
		)
		.await;
		assert_eq!(status, StatusCode::CREATED);
		assert_eq!(body["rows"][0]["mask"], 3);

		let (status, _) = call(
			&share,
			Method::POST,
			"/api/shares",
			Some(json!({ "path": "/srv/films" })),
		)
		.await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(gateway.add_calls(), 1);
	}

	#[tokio::test]
	async fn remote_failure_is_bad_gateway() {
		let gateway = Arc::new(MemoryGateway::new());
		gateway.fail_add(true);
		let share = started(gateway).await;
		let (status, body) = call(
			&share,
			Method::POST,
			"/api/shares",
			Some(json!({ "path": "/x" })),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_GATEWAY);
		assert!(body["error"].as_str().unwrap().contains("addSharedDirectory"));
	}

	#[tokio::test]
	async fn group_popup_and_bad_input() {
		let gateway = Arc::new(MemoryGateway::with_dirs(vec![SharedDirectory::new("/a")]));
		let share = started(gateway).await;
		let (status, body) = call(&share, Method::GET, "/api/shares/0/groups", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["choices"].as_array().unwrap().len(), 5);
		assert_eq!(body["choices"][0]["checked"], false);

		let (status, _) = call(&share, Method::GET, "/api/shares/9/groups", None).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		let (status, _) = call(&share, Method::PUT, "/api/shares/x", None).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		let (status, _) = call(&share, Method::GET, "/nowhere", None).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}
}
