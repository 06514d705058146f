use crate::directory::SharedDirectory;
use crate::error::{RemoteOp, Result, ShareError};
use crate::gateway::SyncGateway;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

const GET_SHARED_DIRECTORIES: &str = "rsFiles/getSharedDirectories";
const ADD_SHARED_DIRECTORY: &str = "rsFiles/addSharedDirectory";
const SET_SHARED_DIRECTORIES: &str = "rsFiles/setSharedDirectories";

#[derive(Deserialize)]
struct FetchResponse {
	retval: bool,
	#[serde(default)]
	dirs: Vec<SharedDirectory>,
}

#[derive(Deserialize)]
struct RetvalResponse {
	retval: bool,
}

#[derive(Serialize)]
struct AddRequest<'a> {
	dir: &'a SharedDirectory,
}

#[derive(Serialize)]
struct SetRequest<'a> {
	dirs: &'a [SharedDirectory],
}

#[derive(Serialize)]
struct EmptyRequest {}

/// Talks to the node's JSON API. Every call is a JSON POST to
/// `{base}/rsFiles/<method>` answered with a `retval` flag.
pub struct JsonApiGateway {
	client: reqwest::Client,
	base: Url,
}

impl JsonApiGateway {
	pub fn new(base: Url) -> Self {
		Self::with_client(reqwest::Client::new(), base)
	}

	pub fn with_client(client: reqwest::Client, mut base: Url) -> Self {
		// Url::join drops the last segment unless the base ends in '/'
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());
			base.set_path(&path);
		}
		Self { client, base }
	}

	pub fn base(&self) -> &Url {
		&self.base
	}

	async fn call<B, R>(&self, op: RemoteOp, method: &str, body: &B) -> Result<R>
	where
		B: Serialize + ?Sized,
		R: DeserializeOwned,
	{
		let url = self
			.base
			.join(method)
			.map_err(|e| ShareError::remote(op, format!("invalid url: {e}")))?;
		log::debug!("POST {url}");
		let res = self
			.client
			.post(url)
			.json(body)
			.send()
			.await
			.map_err(|e| ShareError::remote(op, e.to_string()))?;
		let status = res.status();
		if !status.is_success() {
			return Err(ShareError::remote(op, format!("HTTP status {status}")));
		}
		res.json::<R>()
			.await
			.map_err(|e| ShareError::remote(op, format!("invalid response: {e}")))
	}
}

#[async_trait]
impl SyncGateway for JsonApiGateway {
	async fn fetch_all(&self) -> Result<Vec<SharedDirectory>> {
		let res: FetchResponse = self
			.call(RemoteOp::FetchAll, GET_SHARED_DIRECTORIES, &EmptyRequest {})
			.await?;
		if !res.retval {
			return Err(ShareError::remote(RemoteOp::FetchAll, "retval false"));
		}
		Ok(res.dirs)
	}

	async fn add_one(&self, dir: &SharedDirectory) -> Result<()> {
		let res: RetvalResponse = self
			.call(RemoteOp::AddOne, ADD_SHARED_DIRECTORY, &AddRequest { dir })
			.await?;
		if !res.retval {
			return Err(ShareError::remote(RemoteOp::AddOne, "retval false"));
		}
		Ok(())
	}

	async fn replace_all(&self, dirs: &[SharedDirectory]) -> Result<()> {
		let res: RetvalResponse = self
			.call(RemoteOp::ReplaceAll, SET_SHARED_DIRECTORIES, &SetRequest { dirs })
			.await?;
		if !res.retval {
			return Err(ShareError::remote(RemoteOp::ReplaceAll, "retval false"));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::body::Buf;
	use hyper::service::{make_service_fn, service_fn};
	use hyper::{Body, Request, Response, Server, StatusCode};
	use serde_json::{Value, json};
	use std::convert::Infallible;
	use std::net::SocketAddr;
	use std::sync::{Arc, Mutex};

	#[derive(Default)]
	struct FakeNode {
		dirs: Mutex<Value>,
		requests: Mutex<Vec<(String, Value)>>,
		retval: Mutex<bool>,
	}

	async fn handle(req: Request<Body>, node: Arc<FakeNode>) -> Result<Response<Body>, Infallible> {
		let path = req.uri().path().to_string();
		let buf = hyper::body::aggregate(req.into_body()).await.unwrap();
		let body: Value = serde_json::from_reader(buf.reader()).unwrap_or(Value::Null);
		node.requests.lock().unwrap().push((path.clone(), body.clone()));
		let retval = *node.retval.lock().unwrap();
		let reply = match path.as_str() {
			"/api/rsFiles/getSharedDirectories" => {
				json!({ "retval": retval, "dirs": node.dirs.lock().unwrap().clone() })
			}
			"/api/rsFiles/addSharedDirectory" | "/api/rsFiles/setSharedDirectories" => {
				json!({ "retval": retval })
			}
			_ => {
				return Ok(Response::builder()
					.status(StatusCode::NOT_FOUND)
					.body(Body::empty())
					.unwrap());
			}
		};
		Ok(Response::new(Body::from(reply.to_string())))
	}

	async fn start(node: Arc<FakeNode>) -> SocketAddr {
		let make_svc = make_service_fn(move |_| {
			let node = Arc::clone(&node);
			async move {
				Ok::<_, Infallible>(service_fn(move |req| handle(req, Arc::clone(&node))))
			}
		});
		let server = Server::bind(&"127.0.0.1:0".parse().unwrap()).serve(make_svc);
		let addr = server.local_addr();
		tokio::spawn(server);
		addr
	}

	fn gateway(addr: SocketAddr) -> JsonApiGateway {
		JsonApiGateway::new(format!("http://{addr}/api").parse().unwrap())
	}

	fn node(retval: bool) -> Arc<FakeNode> {
		let node = FakeNode::default();
		*node.retval.lock().unwrap() = retval;
		*node.dirs.lock().unwrap() = json!([
			{ "filename": "/a", "virtualname": "", "shareflags": 3, "parent_groups": [] }
		]);
		Arc::new(node)
	}

	#[tokio::test]
	async fn fetches_directories() {
		let node = node(true);
		let addr = start(node.clone()).await;
		let dirs = gateway(addr).fetch_all().await.unwrap();
		assert_eq!(dirs.len(), 1);
		assert_eq!(dirs[0].path, "/a");
		assert!(dirs[0].flags.anonymous_search && dirs[0].flags.anonymous_download);
		assert!(dirs[0].visibility.is_all());
	}

	#[tokio::test]
	async fn sends_node_request_shapes() {
		let node = node(true);
		let addr = start(node.clone()).await;
		let gateway = gateway(addr);
		let dir = SharedDirectory::new("/srv/share");
		gateway.add_one(&dir).await.unwrap();
		gateway.replace_all(&[dir]).await.unwrap();

		let requests = node.requests.lock().unwrap();
		assert_eq!(requests[0].0, "/api/rsFiles/addSharedDirectory");
		assert_eq!(
			requests[0].1,
			json!({ "dir": { "filename": "/srv/share", "virtualname": "", "shareflags": 3, "parent_groups": [] } })
		);
		assert_eq!(requests[1].0, "/api/rsFiles/setSharedDirectories");
		assert_eq!(requests[1].1["dirs"][0]["filename"], "/srv/share");
	}

	#[tokio::test]
	async fn retval_false_is_remote_failure() {
		let node = node(false);
		let addr = start(node).await;
		let gateway = gateway(addr);
		let err = gateway.fetch_all().await.unwrap_err();
		assert_eq!(
			err,
			ShareError::remote(RemoteOp::FetchAll, "retval false")
		);
		let err = gateway
			.add_one(&SharedDirectory::new("/b"))
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			ShareError::RemoteCallFailure {
				op: RemoteOp::AddOne,
				..
			}
		));
		assert!(gateway.replace_all(&[]).await.unwrap_err().is_remote());
	}

	#[tokio::test]
	async fn http_errors_are_remote_failures() {
		let node = node(true);
		let addr = start(node).await;
		let gateway = JsonApiGateway::new(format!("http://{addr}/elsewhere").parse().unwrap());
		let err = gateway.fetch_all().await.unwrap_err();
		assert!(err.to_string().contains("404"));
	}

	#[tokio::test]
	async fn unreachable_node_is_remote_failure() {
		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		let addr = listener.local_addr().unwrap();
		drop(listener);
		let err = gateway(addr).fetch_all().await.unwrap_err();
		assert!(err.is_remote());
	}

	#[test]
	fn base_without_trailing_slash_keeps_prefix() {
		let gateway = JsonApiGateway::new("http://127.0.0.1:9092/api".parse().unwrap());
		assert_eq!(
			gateway.base().join(GET_SHARED_DIRECTORIES).unwrap().as_str(),
			"http://127.0.0.1:9092/api/rsFiles/getSharedDirectories"
		);
	}
}
