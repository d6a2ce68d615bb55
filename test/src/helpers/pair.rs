//! A server plus its clients, wired over in-memory links.

use std::collections::HashMap;

use mimic_client::{Client, ClientConfig};
use mimic_server::{Server, ServerConfig, UserKey, Visibility};

use crate::test_protocol::protocol;

use super::memory_link::{ClientLink, ClientOutbox, ServerLink, ServerOutbox};

/// One listening server and any number of connected clients, each peer built
/// from its own `protocol()` call the way real peers would be.
pub struct TestPair {
    pub server: Server,
    pub clients: HashMap<UserKey, Client>,
    server_outbox: ServerOutbox,
    client_outboxes: HashMap<UserKey, ClientOutbox>,
}

impl TestPair {
    pub fn new(visibility: Box<dyn Visibility>) -> Self {
        let mut server = Server::new(protocol(), ServerConfig::default(), visibility);
        let (link, server_outbox) = ServerLink::new();
        server.listen(Box::new(link));
        Self {
            server,
            clients: HashMap::new(),
            server_outbox,
            client_outboxes: HashMap::new(),
        }
    }

    /// Registers a connection on the server and stands up the matching client
    pub fn connect_client(&mut self) -> UserKey {
        let user_key = self.server.connect_user(None);
        let mut client = Client::new(protocol(), ClientConfig::default());
        let (link, outbox) = ClientLink::new();
        client.connect(Box::new(link));
        self.clients.insert(user_key, client);
        self.client_outboxes.insert(user_key, outbox);
        user_key
    }

    pub fn client(&mut self, user_key: &UserKey) -> &mut Client {
        self.clients
            .get_mut(user_key)
            .expect("no client for given user key")
    }

    /// One server tick: flush all updates, then deliver everything produced
    pub fn flush_server(&mut self) {
        self.server.send_all_updates();
        self.deliver_to_clients();
    }

    /// Drains the server outbox into each addressee's receive path. Payloads
    /// for users whose client is gone are dropped, as a real transport would.
    pub fn deliver_to_clients(&mut self) {
        loop {
            let next = self.server_outbox.borrow_mut().pop_front();
            let Some((user_key, _channel, payload)) = next else {
                break;
            };
            if let Some(client) = self.clients.get_mut(&user_key) {
                let _ = client.receive_packet(&payload);
            }
        }
    }

    /// Client-side flush of owner-authoritative changes, then delivery
    pub fn flush_client(&mut self, user_key: &UserKey) {
        if let Some(client) = self.clients.get_mut(user_key) {
            client.send_all_updates();
        }
        self.deliver_to_server(user_key);
    }

    /// Drains one client's outbox into the server's receive path
    pub fn deliver_to_server(&mut self, user_key: &UserKey) {
        let Some(outbox) = self.client_outboxes.get(user_key) else {
            return;
        };
        let pending: Vec<(mimic_shared::ChannelKind, Vec<u8>)> =
            outbox.borrow_mut().drain(..).collect();
        for (_channel, payload) in pending {
            let _ = self.server.receive_packet(user_key, &payload);
        }
    }

    /// Packets currently queued for one user, drained without delivery
    pub fn drain_packets_for(&mut self, user_key: &UserKey) -> Vec<Vec<u8>> {
        let mut kept = Vec::new();
        let mut outbox = self.server_outbox.borrow_mut();
        let mut rest = std::collections::VecDeque::new();
        while let Some((key, channel, payload)) = outbox.pop_front() {
            if key == *user_key {
                kept.push(payload);
            } else {
                rest.push_back((key, channel, payload));
            }
        }
        *outbox = rest;
        kept
    }
}
