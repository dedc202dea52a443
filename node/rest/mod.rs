// Copyright 2018-2020 Kodebox, Inc.
// This file is part of CodeChain.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! HTTP front end over the engine. `POST /objects` stores the value of a
//! `name=value` form body and `GET /objects/<hash>` downloads a value.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use cdht::KademliaApi;
use jsonrpc_core::futures::{Future, Stream};
use jsonrpc_core::IoHandler;
use jsonrpc_http_server::hyper::header::HeaderValue;
use jsonrpc_http_server::hyper::{self, Body, Method, StatusCode};
use jsonrpc_http_server::{RequestMiddleware, RequestMiddlewareAction, Response, Server, ServerBuilder};

use crate::shell::commands;

const OBJECTS: &str = "/objects";

#[derive(Serialize)]
struct Created {
    #[serde(rename = "Data")]
    data: String,
    #[serde(rename = "Location")]
    location: String,
}

struct Objects {
    api: Arc<dyn KademliaApi>,
}

impl RequestMiddleware for Objects {
    fn on_request(&self, request: hyper::Request<Body>) -> RequestMiddlewareAction {
        let api = Arc::clone(&self.api);
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let response = request
            .into_body()
            .concat2()
            .map(move |body| hyper::Response::<Body>::from(handle(&*api, &method, &path, &body)));
        RequestMiddlewareAction::Respond {
            should_validate_hosts: true,
            response: Box::new(response),
        }
    }
}

/// Starts the HTTP server on its own event loop threads. Every request is
/// answered by `handle` and never reaches the JSON-RPC handler.
pub fn start_http(addr: &SocketAddr, api: Arc<dyn KademliaApi>) -> Result<Server, io::Error> {
    ServerBuilder::new(IoHandler::new())
        .request_middleware(Objects {
            api,
        })
        .start_http(addr)
}

pub fn handle(api: &dyn KademliaApi, method: &Method, path: &str, body: &[u8]) -> Response {
    cdebug!(REST, "HTTP {} {}", method, path);
    if path == "/" {
        return text(StatusCode::OK, "Example of post: /objects\nExample of get: /objects/{hash}\n")
    }
    if path == OBJECTS {
        if *method != Method::POST {
            return text(StatusCode::METHOD_NOT_ALLOWED, "Invalid HTTP request, try /objects/{hash} for GET")
        }
        return put(api, body)
    }
    match path.strip_prefix("/objects/") {
        Some(hash) if !hash.is_empty() && !hash.contains('/') => {
            if *method != Method::GET {
                return text(StatusCode::METHOD_NOT_ALLOWED, "Invalid HTTP request, try /objects for POST")
            }
            get(api, hash)
        }
        _ => text(StatusCode::NOT_FOUND, "Not Found"),
    }
}

fn put(api: &dyn KademliaApi, body: &[u8]) -> Response {
    let body = match std::str::from_utf8(body) {
        Ok(body) => body,
        Err(_) => return text(StatusCode::BAD_REQUEST, "The body is not UTF-8"),
    };
    let data = match body.find('=') {
        Some(index) => &body[index + 1..],
        None => return text(StatusCode::BAD_REQUEST, "Expected a form body like data=<text>"),
    };

    let hash = match commands::put(api, data) {
        Ok(hash) => hash,
        Err(err) => {
            cwarn!(REST, "HTTP put failed: {}", err);
            return text(StatusCode::INTERNAL_SERVER_ERROR, &err)
        }
    };
    let created = Created {
        data: data.to_string(),
        location: format!("{}/{}", OBJECTS, hash),
    };
    match serde_json::to_string(&created) {
        Ok(content) => Response {
            code: StatusCode::CREATED,
            content_type: HeaderValue::from_static("application/json"),
            content,
        },
        Err(err) => text(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

fn get(api: &dyn KademliaApi, hash: &str) -> Response {
    match commands::get(api, hash) {
        Ok(value) => text(StatusCode::OK, &value),
        Err(err) => text(StatusCode::INTERNAL_SERVER_ERROR, &err),
    }
}

fn text(code: StatusCode, content: &str) -> Response {
    Response {
        code,
        content_type: HeaderValue::from_static("text/plain; charset=utf-8"),
        content: content.to_string(),
    }
}
